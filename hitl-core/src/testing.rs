//! In-memory collaborators for unit tests.

use std::collections::{HashMap, VecDeque};

use crate::sim::{SimCommands, SimData, StatusDisplay, StatusLabel};
use crate::transport::{Transport, TransportError};

/// A stored simulator variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Double(f64),
    Floats(Vec<f32>),
    Ints(Vec<i32>),
}

/// How a command was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandPhase {
    Once,
    Begin,
    End,
}

/// Simulator mock: a name to value map plus a log of writes and commands.
#[derive(Debug, Default)]
pub struct MockSim {
    pub values: HashMap<String, Value>,
    pub writes: Vec<String>,
    pub commands: Vec<(CommandPhase, String)>,
}

impl MockSim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes to `name` since the log was last cleared.
    pub fn write_count(&self, name: &str) -> usize {
        self.writes.iter().filter(|w| *w == name).count()
    }

    pub fn clear_log(&mut self) {
        self.writes.clear();
        self.commands.clear();
    }

    fn scalar(&self, name: &str) -> f64 {
        match self.values.get(name) {
            Some(Value::Int(v)) => f64::from(*v),
            Some(Value::Float(v)) => f64::from(*v),
            Some(Value::Double(v)) => *v,
            Some(Value::Floats(v)) => v.first().copied().map_or(0.0, f64::from),
            Some(Value::Ints(v)) => v.first().copied().map_or(0.0, f64::from),
            None => 0.0,
        }
    }

    fn store(&mut self, name: &str, value: Value) {
        self.writes.push(name.to_string());
        self.values.insert(name.to_string(), value);
    }

    /// Element `index` of an integer array (zero when unset).
    pub fn int_at(&self, name: &str, index: usize) -> i32 {
        match self.values.get(name) {
            Some(Value::Ints(v)) => v.get(index).copied().unwrap_or(0),
            Some(Value::Int(v)) if index == 0 => *v,
            _ => 0,
        }
    }

    /// Element `index` of a float array (zero when unset).
    pub fn float_at(&self, name: &str, index: usize) -> f32 {
        match self.values.get(name) {
            Some(Value::Floats(v)) => v.get(index).copied().unwrap_or(0.0),
            Some(Value::Float(v)) if index == 0 => *v,
            _ => 0.0,
        }
    }
}

impl SimData for MockSim {
    fn get_i32(&self, name: &str) -> i32 {
        self.scalar(name) as i32
    }

    fn get_f32(&self, name: &str) -> f32 {
        self.scalar(name) as f32
    }

    fn get_f64(&self, name: &str) -> f64 {
        self.scalar(name)
    }

    fn get_f32_array(&self, name: &str, offset: usize, out: &mut [f32]) -> usize {
        let Some(Value::Floats(values)) = self.values.get(name) else {
            return 0;
        };
        let src = values.get(offset..).unwrap_or(&[]);
        let n = src.len().min(out.len());
        out[..n].copy_from_slice(&src[..n]);
        n
    }

    fn set_i32(&mut self, name: &str, value: i32) {
        self.store(name, Value::Int(value));
    }

    fn set_f32(&mut self, name: &str, value: f32) {
        self.store(name, Value::Float(value));
    }

    fn set_f64(&mut self, name: &str, value: f64) {
        self.store(name, Value::Double(value));
    }

    fn set_f32_array(&mut self, name: &str, offset: usize, values: &[f32]) {
        let mut current = match self.values.get(name) {
            Some(Value::Floats(v)) => v.clone(),
            _ => Vec::new(),
        };
        if current.len() < offset + values.len() {
            current.resize(offset + values.len(), 0.0);
        }
        current[offset..offset + values.len()].copy_from_slice(values);
        self.store(name, Value::Floats(current));
    }

    fn set_i32_array(&mut self, name: &str, offset: usize, values: &[i32]) {
        let mut current = match self.values.get(name) {
            Some(Value::Ints(v)) => v.clone(),
            _ => Vec::new(),
        };
        if current.len() < offset + values.len() {
            current.resize(offset + values.len(), 0);
        }
        current[offset..offset + values.len()].copy_from_slice(values);
        self.store(name, Value::Ints(current));
    }
}

impl SimCommands for MockSim {
    fn command_once(&mut self, name: &str) {
        self.commands.push((CommandPhase::Once, name.to_string()));
    }

    fn command_begin(&mut self, name: &str) {
        self.commands.push((CommandPhase::Begin, name.to_string()));
    }

    fn command_end(&mut self, name: &str) {
        self.commands.push((CommandPhase::End, name.to_string()));
    }
}

/// Status label mock that keeps the current text and every update.
#[derive(Debug, Default)]
pub struct MockDisplay {
    pub labels: HashMap<StatusLabel, String>,
    pub history: Vec<(StatusLabel, String)>,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, label: StatusLabel) -> Option<&str> {
        self.labels.get(&label).map(String::as_str)
    }

    pub fn updates(&self, label: StatusLabel) -> usize {
        self.history.iter().filter(|(l, _)| *l == label).count()
    }
}

impl StatusDisplay for MockDisplay {
    fn set_text(&mut self, label: StatusLabel, text: &str) {
        self.labels.insert(label, text.to_string());
        self.history.push((label, text.to_string()));
    }
}

/// Transport mock with a scripted receive queue and a captured transmit log.
#[derive(Debug)]
pub struct MockTransport {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub open: bool,
    pub fail_reads: bool,
    pub fail_writes: bool,
    /// Most bytes reported by one `available` call.
    pub chunk: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
            open: true,
            fail_reads: false,
            fail_writes: false,
            chunk: usize::MAX,
        }
    }

    pub fn queue(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes);
    }
}

impl Transport for MockTransport {
    fn available(&mut self) -> Result<usize, TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        if self.fail_reads {
            return Err(TransportError::Io);
        }
        Ok(self.rx.len().min(self.chunk))
    }

    fn read_byte(&mut self) -> Result<u8, TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        self.rx.pop_front().ok_or(TransportError::Io)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        if self.fail_writes {
            return Err(TransportError::Io);
        }
        self.tx.extend_from_slice(bytes);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }
}
