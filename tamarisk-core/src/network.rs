use crate::{
    error::GlueError,
    glue::{EpisodeExit, Glue, ObservationAction, StepResult},
    ipc::{Command, EXPERIMENT_CONNECTION, Packet, receive_packet, send_packet},
};
use std::{io::BufReader, net::TcpStream, time::Duration};
use tracing::{debug, info};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlueEndpoint {
    pub host: String,
    pub port: u16,
    /// `None` blocks until rl_glue answers.
    pub read_timeout: Option<Duration>,
}

impl Default for GlueEndpoint {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            read_timeout: None,
        }
    }
}

impl GlueEndpoint {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Experiment connection to an rl_glue server over TCP.
pub struct TcpGlue {
    conn: BufReader<TcpStream>,
    // set after the first failed exchange, the stream position is unknown from then on
    broken: bool,
}

impl TcpGlue {
    pub fn connect(endpoint: &GlueEndpoint) -> Result<Self, GlueError> {
        let addr = endpoint.addr();
        if endpoint.read_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(GlueError::ZeroReadTimeout);
        }
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .map_err(|source| GlueError::Connect {
                addr: addr.clone(),
                source,
            })?;
        stream.set_read_timeout(endpoint.read_timeout)?;
        stream.set_nodelay(true)?;
        let mut conn = BufReader::new(stream);
        send_packet(conn.get_mut(), &Packet::new(EXPERIMENT_CONNECTION))?;
        info!("connected to rl_glue at {addr}");
        Ok(Self {
            conn,
            broken: false,
        })
    }

    fn call(&mut self, packet: Packet, command: Command) -> Result<Packet, GlueError> {
        if self.broken {
            return Err(GlueError::Closed);
        }
        let response = self.exchange(&packet, command);
        if response.is_err() {
            self.broken = true;
        }
        response
    }

    fn exchange(&mut self, packet: &Packet, command: Command) -> Result<Packet, GlueError> {
        debug!(?command, payload = packet.payload().len(), "sending");
        send_packet(self.conn.get_mut(), packet)?;
        let response = receive_packet(&mut self.conn)?;
        if response.state() != command.code() {
            return Err(GlueError::Desync {
                expected: command.code(),
                got: response.state(),
            });
        }
        Ok(response)
    }

    fn message(&mut self, command: Command, message: &str) -> Result<String, GlueError> {
        let mut packet = Packet::command(command);
        packet.put_string(message)?;
        let response = self.call(packet, command)?;
        response.reader().get_string()
    }

    pub fn start(&mut self) -> Result<ObservationAction, GlueError> {
        let response = self.call(Packet::command(Command::Start), Command::Start)?;
        let mut reader = response.reader();
        let observation = reader.get_abstract()?;
        let action = reader.get_abstract()?;
        Ok(ObservationAction {
            observation,
            action,
        })
    }

    pub fn step(&mut self) -> Result<StepResult, GlueError> {
        let response = self.call(Packet::command(Command::Step), Command::Step)?;
        let mut reader = response.reader();
        let terminal = reader.get_int()? == 1;
        let reward = reader.get_double()?;
        let observation = reader.get_abstract()?;
        let action = reader.get_abstract()?;
        Ok(StepResult {
            reward,
            observation,
            action,
            terminal,
        })
    }

    pub fn num_steps(&mut self) -> Result<i32, GlueError> {
        let response = self.call(Packet::command(Command::NumSteps), Command::NumSteps)?;
        response.reader().get_int()
    }

    pub fn num_episodes(&mut self) -> Result<i32, GlueError> {
        let response = self.call(Packet::command(Command::NumEpisodes), Command::NumEpisodes)?;
        response.reader().get_int()
    }
}

impl Glue for TcpGlue {
    fn init(&mut self) -> Result<String, GlueError> {
        let response = self.call(Packet::command(Command::Init), Command::Init)?;
        response.reader().get_string()
    }

    fn agent_message(&mut self, message: &str) -> Result<String, GlueError> {
        self.message(Command::AgentMessage, message)
    }

    fn env_message(&mut self, message: &str) -> Result<String, GlueError> {
        self.message(Command::EnvMessage, message)
    }

    fn episode(&mut self, max_steps: u32) -> Result<EpisodeExit, GlueError> {
        let steps = i32::try_from(max_steps).map_err(|_| GlueError::StepLimit(max_steps))?;
        let mut packet = Packet::command(Command::Episode);
        packet.put_int(steps)?;
        let response = self.call(packet, Command::Episode)?;
        Ok(EpisodeExit::from(response.reader().get_int()?))
    }

    fn return_value(&mut self) -> Result<f64, GlueError> {
        let response = self.call(Packet::command(Command::Return), Command::Return)?;
        response.reader().get_double()
    }

    fn cleanup(&mut self) -> Result<(), GlueError> {
        self.call(Packet::command(Command::Cleanup), Command::Cleanup)?;
        Ok(())
    }
}
