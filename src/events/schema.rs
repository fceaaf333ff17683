//! Event layouts known to the gateway.
//!
//! An event is a fixed list of typed fields, each either indexed (read from a
//! topic) or not (read from the data segment). Supporting a new contract
//! event means adding a const here and registering it.

use alloy::dyn_abi::DynSolType;
use alloy::primitives::{keccak256, B256};
use std::collections::HashMap;

/// Primitive Solidity types the token contract's events use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Address,
    Uint256,
    Bool,
    Bytes32,
    String,
}

impl FieldType {
    /// Canonical Solidity name, as used in event signatures.
    pub fn sol_name(self) -> &'static str {
        match self {
            FieldType::Address => "address",
            FieldType::Uint256 => "uint256",
            FieldType::Bool => "bool",
            FieldType::Bytes32 => "bytes32",
            FieldType::String => "string",
        }
    }

    /// Dynamic types are stored as their keccak hash when indexed.
    pub fn is_dynamic(self) -> bool {
        matches!(self, FieldType::String)
    }

    pub(crate) fn dyn_type(self) -> DynSolType {
        match self {
            FieldType::Address => DynSolType::Address,
            FieldType::Uint256 => DynSolType::Uint(256),
            FieldType::Bool => DynSolType::Bool,
            FieldType::Bytes32 => DynSolType::FixedBytes(32),
            FieldType::String => DynSolType::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub ty: FieldType,
    pub indexed: bool,
}

const fn field(name: &'static str, ty: FieldType, indexed: bool) -> FieldDescriptor {
    FieldDescriptor { name, ty, indexed }
}

/// One event's name and ordered field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSchema {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl EventSchema {
    /// `Name(type1,type2,...)`.
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self.fields.iter().map(|f| f.ty.sol_name()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// Topic 0 of every log this event emits.
    pub fn topic0(&self) -> B256 {
        keccak256(self.signature().as_bytes())
    }

    /// Topics a well-formed log carries, including topic 0.
    pub fn topic_count(&self) -> usize {
        1 + self.fields.iter().filter(|f| f.indexed).count()
    }

    pub fn indexed_fields(&self) -> impl Iterator<Item = &'static FieldDescriptor> {
        self.fields.iter().filter(|f| f.indexed)
    }

    pub fn data_fields(&self) -> impl Iterator<Item = &'static FieldDescriptor> {
        self.fields.iter().filter(|f| !f.indexed)
    }
}

/// `Transfer(address indexed from, address indexed to, uint256 value)`
pub const TRANSFER: EventSchema = EventSchema {
    name: "Transfer",
    fields: &[
        field("from", FieldType::Address, true),
        field("to", FieldType::Address, true),
        field("value", FieldType::Uint256, false),
    ],
};

/// `TransferWithDetails(address indexed from, address indexed to, uint256 value, string message, uint256 timestamp)`
pub const TRANSFER_WITH_DETAILS: EventSchema = EventSchema {
    name: "TransferWithDetails",
    fields: &[
        field("from", FieldType::Address, true),
        field("to", FieldType::Address, true),
        field("value", FieldType::Uint256, false),
        field("message", FieldType::String, false),
        field("timestamp", FieldType::Uint256, false),
    ],
};

/// Schemas keyed by topic 0.
#[derive(Debug, Clone)]
pub struct EventRegistry {
    by_topic: HashMap<B256, EventSchema>,
    order: Vec<B256>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self {
            by_topic: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registry of the token contract's transfer events.
    pub fn token_events() -> Self {
        let mut registry = Self::new();
        registry.register(TRANSFER);
        registry.register(TRANSFER_WITH_DETAILS);
        registry
    }

    pub fn register(&mut self, schema: EventSchema) {
        let topic = schema.topic0();
        if self.by_topic.insert(topic, schema).is_none() {
            self.order.push(topic);
        }
    }

    pub fn get(&self, topic0: &B256) -> Option<&EventSchema> {
        self.by_topic.get(topic0)
    }

    /// Topic 0 values in registration order, for `eth_getLogs` filters.
    pub fn signatures(&self) -> Vec<B256> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::token_events()
    }
}
