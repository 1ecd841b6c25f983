//! Host seam for the idlh WebIDL conformance harness.
//!
//! The harness never talks to a JavaScript engine directly. Everything it
//! needs from the environment under test goes through the [`Realm`] trait:
//! property descriptors, prototype access and mutation, calls, `typeof`,
//! class strings, `instanceof`, promise state and evaluation of the object
//! expressions registered with `add_objects`.
//!
//! [`MemoryRealm`] is a small ECMAScript-style object heap implementing the
//! trait. Together with the helpers in [`memory::bindings`] it can model a
//! WebIDL binding layer (interface objects, prototype objects, accessors,
//! brand checks) without an engine.

pub mod memory;
pub mod realm;
pub mod value;

pub use memory::bindings::{AttributeOptions, InterfaceBinding, IterationKind, OperationOptions};
pub use memory::{MemoryRealm, NativeFn, native};
pub use realm::{Intrinsic, PrototypeMutation, Realm, RealmExt};
pub use value::{
    ObjectId, PromiseState, PropertyDescriptor, PropertyKey, SymbolId, Thrown, Value,
    WellKnownSymbol, number_to_string,
};
