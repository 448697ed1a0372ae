// In-process stand-in for the rl_glue server, speaking the experiment side of the protocol.

use crate::{
    error::GlueError,
    glue::AbstractType,
    ipc::{Command, EXPERIMENT_CONNECTION, Packet, receive_packet, send_packet},
    network::GlueEndpoint,
};
use std::{
    io::{self, BufReader, ErrorKind},
    net::{SocketAddr, TcpListener},
    thread::JoinHandle,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Init,
    Start,
    Step,
    Cleanup,
    Return,
    NumSteps,
    NumEpisodes,
    Episode(i32),
    AgentMessage(String),
    EnvMessage(String),
}

#[derive(Debug, Clone, Default)]
pub struct FakeRlGlueConfig {
    pub task_spec: String,
    /// Handed out in order by `RL_return`, cycling when exhausted.
    pub returns: Vec<f64>,
    /// Answer this command with the wrong state.
    pub desync_on: Option<Command>,
}

pub struct FakeRlGlue {
    addr: SocketAddr,
    handle: JoinHandle<Result<Vec<Request>, GlueError>>,
}

impl FakeRlGlue {
    pub fn spawn(config: FakeRlGlueConfig) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let handle = std::thread::spawn(move || serve(listener, config));
        Ok(Self { addr, handle })
    }

    pub fn endpoint(&self) -> GlueEndpoint {
        GlueEndpoint {
            host: self.addr.ip().to_string(),
            port: self.addr.port(),
            read_timeout: None,
        }
    }

    /// Waits for the experiment to disconnect and returns what it asked for.
    pub fn join(self) -> Result<Vec<Request>, GlueError> {
        self.handle.join().unwrap()
    }
}

fn serve(listener: TcpListener, config: FakeRlGlueConfig) -> Result<Vec<Request>, GlueError> {
    let (stream, _) = listener.accept()?;
    let mut conn = BufReader::new(stream);
    let hello = receive_packet(&mut conn)?;
    if hello.state() != EXPERIMENT_CONNECTION {
        return Err(GlueError::Malformed(format!(
            "expected experiment connection, got {}",
            hello.state()
        )));
    }
    let mut requests = vec![];
    let mut next_return = 0;
    let mut episodes = 0;
    loop {
        let packet = match receive_packet(&mut conn) {
            Ok(packet) => packet,
            Err(GlueError::Io(err)) if err.kind() == ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err),
        };
        let command = Command::from_code(packet.state())
            .ok_or_else(|| GlueError::Malformed(format!("unknown command {}", packet.state())))?;
        let state = if config.desync_on == Some(command) {
            0
        } else {
            command.code()
        };
        let mut reader = packet.reader();
        let mut reply = Packet::new(state);
        let request = match command {
            Command::Init => {
                reply.put_string(&config.task_spec)?;
                Request::Init
            }
            Command::AgentMessage => {
                let message = reader.get_string()?;
                reply.put_string("ok")?;
                Request::AgentMessage(message)
            }
            Command::EnvMessage => {
                let message = reader.get_string()?;
                reply.put_string("ok")?;
                Request::EnvMessage(message)
            }
            Command::Episode => {
                let steps = reader.get_int()?;
                episodes += 1;
                reply.put_int(0)?;
                Request::Episode(steps)
            }
            Command::Return => {
                let value = match config.returns.len() {
                    0 => 0.,
                    len => config.returns[next_return % len],
                };
                next_return += 1;
                reply.put_double(value)?;
                Request::Return
            }
            Command::Start => {
                let observation = AbstractType {
                    ints: vec![1, 2, 3],
                    ..Default::default()
                };
                reply.put_abstract(&observation)?;
                reply.put_abstract(&AbstractType::default())?;
                Request::Start
            }
            Command::Step => {
                reply.put_int(1)?;
                reply.put_double(-1.5)?;
                reply.put_abstract(&AbstractType::default())?;
                reply.put_abstract(&AbstractType::default())?;
                Request::Step
            }
            Command::NumSteps => {
                reply.put_int(episodes * 100)?;
                Request::NumSteps
            }
            Command::NumEpisodes => {
                reply.put_int(episodes)?;
                Request::NumEpisodes
            }
            Command::Cleanup => Request::Cleanup,
        };
        send_packet(conn.get_mut(), &reply)?;
        requests.push(request);
        if command == Command::Cleanup {
            break;
        }
    }
    Ok(requests)
}
