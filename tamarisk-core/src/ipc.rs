use crate::{error::GlueError, glue::AbstractType};
use bincode::{
    Decode, Encode,
    config::{self, BigEndian, Configuration, Fixint},
};
use std::io::{self, Read, Write};

/// Connection kind announced by an experiment program.
pub const EXPERIMENT_CONNECTION: i32 = 1;

pub const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Init,
    Start,
    Step,
    Cleanup,
    Return,
    NumSteps,
    NumEpisodes,
    Episode,
    AgentMessage,
    EnvMessage,
}

impl Command {
    pub fn code(self) -> i32 {
        match self {
            Self::Init => 20,
            Self::Start => 21,
            Self::Step => 22,
            Self::Cleanup => 23,
            Self::Return => 24,
            Self::NumSteps => 25,
            Self::NumEpisodes => 26,
            Self::Episode => 27,
            Self::AgentMessage => 33,
            Self::EnvMessage => 34,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let command = match code {
            20 => Self::Init,
            21 => Self::Start,
            22 => Self::Step,
            23 => Self::Cleanup,
            24 => Self::Return,
            25 => Self::NumSteps,
            26 => Self::NumEpisodes,
            27 => Self::Episode,
            33 => Self::AgentMessage,
            34 => Self::EnvMessage,
            _ => return None,
        };
        Some(command)
    }
}

// rl_glue speaks fixed width big endian everywhere
fn wire() -> Configuration<BigEndian, Fixint> {
    config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct Header {
    pub state: i32,
    pub payload_len: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    state: i32,
    payload: Vec<u8>,
}

impl Packet {
    pub fn new(state: i32) -> Self {
        Self {
            state,
            payload: vec![],
        }
    }

    pub fn command(command: Command) -> Self {
        Self::new(command.code())
    }

    pub fn state(&self) -> i32 {
        self.state
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn put_int(&mut self, value: i32) -> Result<(), GlueError> {
        bincode::encode_into_std_write(value, &mut self.payload, wire())?;
        Ok(())
    }

    pub fn put_double(&mut self, value: f64) -> Result<(), GlueError> {
        bincode::encode_into_std_write(value, &mut self.payload, wire())?;
        Ok(())
    }

    pub fn put_string(&mut self, value: &str) -> Result<(), GlueError> {
        self.put_len(value.len())?;
        self.payload.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn put_abstract(&mut self, value: &AbstractType) -> Result<(), GlueError> {
        self.put_len(value.ints.len())?;
        self.put_len(value.doubles.len())?;
        self.put_len(value.chars.len())?;
        for int in &value.ints {
            self.put_int(*int)?;
        }
        for double in &value.doubles {
            self.put_double(*double)?;
        }
        self.payload.extend_from_slice(&value.chars);
        Ok(())
    }

    pub fn reader(&self) -> PacketReader<'_> {
        PacketReader {
            payload: &self.payload,
            pos: 0,
        }
    }

    fn put_len(&mut self, len: usize) -> Result<(), GlueError> {
        let len = i32::try_from(len)
            .map_err(|_| GlueError::Malformed(format!("length {len} exceeds i32")))?;
        self.put_int(len)
    }
}

/// Cursor over a received payload.
#[derive(Debug)]
pub struct PacketReader<'a> {
    payload: &'a [u8],
    pos: usize,
}

impl PacketReader<'_> {
    pub fn remaining(&self) -> usize {
        self.payload.len() - self.pos
    }

    pub fn get_int(&mut self) -> Result<i32, GlueError> {
        let (value, read) = bincode::decode_from_slice(&self.payload[self.pos..], wire())?;
        self.pos += read;
        Ok(value)
    }

    pub fn get_double(&mut self) -> Result<f64, GlueError> {
        let (value, read) = bincode::decode_from_slice(&self.payload[self.pos..], wire())?;
        self.pos += read;
        Ok(value)
    }

    pub fn get_string(&mut self) -> Result<String, GlueError> {
        let len = self.get_len()?;
        let bytes = self.take(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn get_abstract(&mut self) -> Result<AbstractType, GlueError> {
        let n_ints = self.get_len()?;
        let n_doubles = self.get_len()?;
        let n_chars = self.get_len()?;
        let ints = (0..n_ints)
            .map(|_| self.get_int())
            .collect::<Result<Vec<_>, _>>()?;
        let doubles = (0..n_doubles)
            .map(|_| self.get_double())
            .collect::<Result<Vec<_>, _>>()?;
        let chars = self.take(n_chars)?.to_vec();
        Ok(AbstractType {
            ints,
            doubles,
            chars,
        })
    }

    fn get_len(&mut self) -> Result<usize, GlueError> {
        let len = self.get_int()?;
        usize::try_from(len).map_err(|_| GlueError::Malformed(format!("negative length {len}")))
    }

    fn take(&mut self, len: usize) -> Result<&[u8], GlueError> {
        if len > self.remaining() {
            return Err(GlueError::Malformed(format!(
                "needs {len} bytes, {} left",
                self.remaining()
            )));
        }
        let bytes = &self.payload[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }
}

// Custom low level protocol to send data
pub fn send_packet<W: Write>(conn: &mut W, packet: &Packet) -> Result<(), GlueError> {
    let payload_len = i32::try_from(packet.payload.len())
        .map_err(|_| GlueError::Malformed("payload exceeds i32".into()))?;
    let header = Header {
        state: packet.state,
        payload_len,
    };
    let header = bincode::encode_to_vec(header, wire())?;
    conn.write_all(&header)?;
    conn.write_all(&packet.payload)?;
    conn.flush()?;
    Ok(())
}

// Custom low level protocol to receive data
pub fn receive_packet<R: Read>(conn: &mut R) -> Result<Packet, GlueError> {
    let mut header = [0u8; HEADER_LEN];
    conn.read_exact(&mut header)?;
    let (header, _): (Header, _) = bincode::decode_from_slice(&header, wire())?;
    let len = usize::try_from(header.payload_len).map_err(|_| {
        GlueError::Malformed(format!("negative payload length {}", header.payload_len))
    })?;
    // grows with the bytes that actually arrive instead of trusting the header
    let mut payload = Vec::new();
    conn.by_ref().take(len as u64).read_to_end(&mut payload)?;
    if payload.len() < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("payload ended after {} of {len} bytes", payload.len()),
        )
        .into());
    }
    Ok(Packet {
        state: header.state,
        payload,
    })
}

#[cfg(test)]
mod test {
    use super::{Command, Packet, receive_packet, send_packet};
    use crate::{error::GlueError, glue::AbstractType};
    use std::io::Cursor;

    #[test]
    fn header_is_big_endian() {
        let mut packet = Packet::command(Command::Episode);
        packet.put_int(100).unwrap();
        let mut wire = vec![];
        send_packet(&mut wire, &packet).unwrap();
        assert_eq!(wire, [0, 0, 0, 27, 0, 0, 0, 4, 0, 0, 0, 100]);
    }

    #[test]
    fn string_is_length_prefixed() {
        let mut packet = Packet::command(Command::AgentMessage);
        packet.put_string("plan").unwrap();
        assert_eq!(packet.payload(), [0, 0, 0, 4, b'p', b'l', b'a', b'n']);
        assert_eq!(packet.reader().get_string().unwrap(), "plan");
    }

    #[test]
    fn double_round_trips_through_the_wire() {
        let mut packet = Packet::command(Command::Return);
        packet.put_double(-1234.5).unwrap();
        assert_eq!(packet.payload(), (-1234.5f64).to_be_bytes());
        let mut wire = vec![];
        send_packet(&mut wire, &packet).unwrap();
        let received = receive_packet(&mut Cursor::new(wire)).unwrap();
        assert_eq!(received.state(), Command::Return.code());
        assert_eq!(received.reader().get_double().unwrap(), -1234.5);
    }

    #[test]
    fn abstract_type_layout() {
        let observation = AbstractType {
            ints: vec![1, 3],
            doubles: vec![0.5],
            chars: b"ab".to_vec(),
        };
        let mut packet = Packet::command(Command::Start);
        packet.put_abstract(&observation).unwrap();
        // three counts, two ints, one double, two chars
        assert_eq!(packet.payload().len(), 12 + 8 + 8 + 2);
        let mut reader = packet.reader();
        assert_eq!(reader.get_abstract().unwrap(), observation);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn truncated_string_is_malformed() {
        let mut packet = Packet::command(Command::EnvMessage);
        packet.put_int(10).unwrap();
        let err = packet.reader().get_string().unwrap_err();
        assert!(matches!(err, GlueError::Malformed(_)));
    }

    #[test]
    fn short_header_is_an_io_error() {
        let err = receive_packet(&mut Cursor::new(vec![0, 0, 0])).unwrap_err();
        assert!(matches!(err, GlueError::Io(_)));
    }

    #[test]
    fn oversized_length_with_short_payload_is_an_eof() {
        // header claims i32::MAX bytes, only three follow
        let wire = vec![0, 0, 0, 24, 0x7f, 0xff, 0xff, 0xff, 1, 2, 3];
        let err = receive_packet(&mut Cursor::new(wire)).unwrap_err();
        assert!(
            matches!(err, GlueError::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
        );
    }

    #[test]
    fn negative_length_is_malformed() {
        let wire = vec![0, 0, 0, 24, 0xff, 0xff, 0xff, 0xff];
        let err = receive_packet(&mut Cursor::new(wire)).unwrap_err();
        assert!(matches!(err, GlueError::Malformed(_)));
    }

    #[test]
    fn command_codes_round_trip() {
        for code in [20, 21, 22, 23, 24, 25, 26, 27, 33, 34] {
            assert_eq!(Command::from_code(code).map(Command::code), Some(code));
        }
        assert_eq!(Command::from_code(35), None);
    }
}
