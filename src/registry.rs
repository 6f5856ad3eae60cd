// Copyright 2026 Cornell University
// released under MIT License

//! # Interface registry
//! The registry is the static description of a DUT's ports: for every
//! interface name it records the direction, whether the port is a stream or
//! a scalar signal, and the codec used for its words. It is built once and
//! never modified afterwards.
//!
//! `Ports` holds the storage behind each binding (a FIFO for streams, the
//! current value for signals). The harness writes and reads it between
//! invocations and the DUT operates on it during an invocation.

use std::collections::VecDeque;
use std::fmt;
use std::ops::Index;
use std::rc::Rc;

use cranelift_entity::{entity_impl, PrimaryMap, SecondaryMap};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::word::{Word, WordCodec};

#[derive(Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct BindingId(u32);
entity_impl!(BindingId, "binding");

/// Direction as seen from the DUT: the harness writes `Input`s and reads `Output`s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "input"),
            Direction::Output => write!(f, "output"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// A FIFO of words (e.g. an AXI4-Stream)
    Stream,
    /// A scalar port that always holds exactly one value
    Signal,
}

/// One entry of the registry
#[derive(Debug, Clone)]
pub struct Binding {
    id: BindingId,
    name: String,
    direction: Direction,
    kind: PortKind,
    codec: Rc<dyn WordCodec>,
}

impl Binding {
    pub fn id(&self) -> BindingId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn kind(&self) -> PortKind {
        self.kind
    }

    pub fn codec(&self) -> &dyn WordCodec {
        self.codec.as_ref()
    }

    /// Hands `word` to the port: streams enqueue it, signals overwrite their value
    pub fn write(&self, ports: &mut Ports, word: Word) {
        match self.kind {
            PortKind::Stream => ports.push(self.id, word),
            PortKind::Signal => ports.set_signal(self.id, word),
        }
    }

    /// Takes one word from the port. Streams return `None` when empty;
    /// signals always yield their current value.
    pub fn read(&self, ports: &mut Ports) -> Option<Word> {
        match self.kind {
            PortKind::Stream => ports.pop(self.id),
            PortKind::Signal => Some(ports.signal(self.id).clone()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("interface `{0}` is declared more than once")]
    Duplicate(String),
}

/// Returned by `Registry::resolve` when no binding has the requested
/// name and direction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no {direction} interface named `{name}`")]
pub struct NotFound {
    pub name: String,
    pub direction: Direction,
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    bindings: PrimaryMap<BindingId, Binding>,
    by_name: FxHashMap<String, BindingId>,
    duplicate: Option<String>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(
        mut self,
        name: &str,
        direction: Direction,
        kind: PortKind,
        codec: impl WordCodec + 'static,
    ) -> Self {
        if self.by_name.contains_key(name) {
            self.duplicate.get_or_insert_with(|| name.to_string());
            return self;
        }
        let id = self.bindings.next_key();
        self.bindings.push(Binding {
            id,
            name: name.to_string(),
            direction,
            kind,
            codec: Rc::new(codec),
        });
        self.by_name.insert(name.to_string(), id);
        self
    }

    /// Declares a stream the harness writes into
    pub fn stream_in(self, name: &str, codec: impl WordCodec + 'static) -> Self {
        self.add(name, Direction::Input, PortKind::Stream, codec)
    }

    /// Declares a stream the harness reads from
    pub fn stream_out(self, name: &str, codec: impl WordCodec + 'static) -> Self {
        self.add(name, Direction::Output, PortKind::Stream, codec)
    }

    pub fn signal_in(self, name: &str, codec: impl WordCodec + 'static) -> Self {
        self.add(name, Direction::Input, PortKind::Signal, codec)
    }

    pub fn signal_out(self, name: &str, codec: impl WordCodec + 'static) -> Self {
        self.add(name, Direction::Output, PortKind::Signal, codec)
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        match self.duplicate {
            Some(name) => Err(RegistryError::Duplicate(name)),
            None => Ok(Registry {
                bindings: self.bindings,
                by_name: self.by_name,
            }),
        }
    }
}

/// Immutable mapping from interface names to their bindings
#[derive(Debug)]
pub struct Registry {
    bindings: PrimaryMap<BindingId, Binding>,
    by_name: FxHashMap<String, BindingId>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Finds a binding by name, regardless of its direction
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.by_name.get(name).map(|id| &self.bindings[*id])
    }

    /// Finds the binding called `name`, which must have the given `direction`
    pub fn resolve(&self, name: &str, direction: Direction) -> Result<&Binding, NotFound> {
        self.lookup(name)
            .filter(|binding| binding.direction == direction)
            .ok_or_else(|| NotFound {
                name: name.to_string(),
                direction,
            })
    }

    /// All bindings, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    /// Stream bindings, in declaration order
    pub fn streams(&self) -> impl Iterator<Item = &Binding> {
        self.iter()
            .filter(|binding| binding.kind == PortKind::Stream)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Index<BindingId> for Registry {
    type Output = Binding;

    fn index(&self, index: BindingId) -> &Self::Output {
        &self.bindings[index]
    }
}

impl Index<&str> for Registry {
    type Output = Binding;

    fn index(&self, name: &str) -> &Self::Output {
        self.lookup(name)
            .unwrap_or_else(|| panic!("no interface named `{name}` in the registry"))
    }
}

/// Storage behind every binding of a registry
#[derive(Debug, Clone)]
pub struct Ports {
    fifos: SecondaryMap<BindingId, VecDeque<Word>>,
    signals: SecondaryMap<BindingId, Word>,
}

impl Ports {
    /// Creates empty streams and zero-valued signals for `registry`
    pub fn new(registry: &Registry) -> Self {
        let mut signals = SecondaryMap::new();
        for binding in registry.iter() {
            if binding.kind == PortKind::Signal {
                signals[binding.id] = binding.codec.zero();
            }
        }
        Self {
            fifos: SecondaryMap::new(),
            signals,
        }
    }

    pub fn push(&mut self, id: BindingId, word: Word) {
        self.fifos[id].push_back(word);
    }

    pub fn pop(&mut self, id: BindingId) -> Option<Word> {
        self.fifos[id].pop_front()
    }

    /// Number of words currently buffered in stream `id`
    pub fn occupancy(&self, id: BindingId) -> usize {
        self.fifos[id].len()
    }

    pub fn is_empty(&self, id: BindingId) -> bool {
        self.fifos[id].is_empty()
    }

    /// Removes and returns everything buffered in stream `id`
    pub fn drain(&mut self, id: BindingId) -> Vec<Word> {
        self.fifos[id].drain(..).collect()
    }

    pub fn signal(&self, id: BindingId) -> &Word {
        &self.signals[id]
    }

    pub fn set_signal(&mut self, id: BindingId, word: Word) {
        self.signals[id] = word;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{AxisCodec, ScalarCodec};

    fn two_streams() -> Registry {
        Registry::builder()
            .stream_in("axis_input", AxisCodec::new("uaxis_l", 64))
            .stream_out("axis_output", AxisCodec::new("uaxis_l", 64))
            .signal_in("enable", ScalarCodec::new(1))
            .build()
            .unwrap()
    }

    #[test]
    fn resolve_checks_direction() {
        let registry = two_streams();
        assert_eq!(registry.len(), 3);
        let input = registry.resolve("axis_input", Direction::Input).unwrap();
        assert_eq!(input.name(), "axis_input");
        assert_eq!(input.kind(), PortKind::Stream);

        let err = registry.resolve("axis_input", Direction::Output).unwrap_err();
        assert_eq!(err.to_string(), "no output interface named `axis_input`");
        assert!(registry.resolve("axis_missing", Direction::Input).is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Registry::builder()
            .stream_in("x", AxisCodec::new("uaxis_l", 8))
            .stream_out("x", AxisCodec::new("uaxis_l", 8))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("x".to_string()));
    }

    #[test]
    fn streams_keep_declaration_order() {
        let registry = two_streams();
        let names: Vec<&str> = registry.streams().map(|b| b.name()).collect();
        assert_eq!(names, vec!["axis_input", "axis_output"]);
    }

    #[test]
    fn stream_ports_are_fifos() {
        let registry = two_streams();
        let mut ports = Ports::new(&registry);
        let input = &registry["axis_input"];
        let first = input.codec().encode(&[1, 0]).unwrap();
        let second = input.codec().encode(&[2, 1]).unwrap();
        input.write(&mut ports, first.clone());
        input.write(&mut ports, second.clone());
        assert_eq!(ports.occupancy(input.id()), 2);
        assert_eq!(input.read(&mut ports), Some(first));
        assert_eq!(ports.drain(input.id()), vec![second]);
        assert!(ports.is_empty(input.id()));
        assert_eq!(input.read(&mut ports), None);
    }

    #[test]
    fn signals_start_at_zero_and_are_never_empty() {
        let registry = two_streams();
        let mut ports = Ports::new(&registry);
        let enable = &registry["enable"];
        assert_eq!(enable.read(&mut ports).unwrap().values(), vec![0]);
        enable.write(&mut ports, enable.codec().encode(&[1]).unwrap());
        assert_eq!(enable.read(&mut ports).unwrap().values(), vec![1]);
        assert_eq!(enable.read(&mut ports).unwrap().values(), vec![1]);
    }
}
