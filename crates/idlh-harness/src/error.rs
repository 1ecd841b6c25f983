//! Error types.
//!
//! Two kinds of failure are kept apart:
//!
//! - [`HarnessError`]: the test author misused the harness (duplicate
//!   identifiers, missing bases, circular inheritance, bad options). Raised
//!   from registration and from `IdlArray::test` setup, aborting the run.
//! - [`AssertionError`]: the object under test does not conform. Only ever
//!   produced inside a generated check and recorded in the report.
//!
//! [`Failure`] is what a generated check body can end with.

use idlh_host::Thrown;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("The only and except options can't be used together.")]
    OnlyAndExcept,

    #[error("Duplicate identifier {0}")]
    DuplicateIdentifier(String),

    #[error("Inheritance for {0} was already defined")]
    InheritanceRedefined(String),

    #[error("{name}: {kind} not yet supported")]
    UnsupportedDeclaration { name: String, kind: String },

    #[error("{lhs} inherits {rhs}, but {rhs} is undefined.")]
    UndefinedBase { lhs: String, rhs: String },

    #[error("{lhs} inherits {rhs}, but {culprit} is not an interface.")]
    InheritanceKindMismatch {
        lhs: String,
        rhs: String,
        culprit: String,
    },

    #[error("{kind} {base} not found (inherited by {name})")]
    BaseNotFound {
        kind: String,
        base: String,
        name: String,
    },

    #[error("{name} has a circular dependency: {chain}")]
    CircularDependency { name: String, chain: String },

    #[error("Unrecognized type {0}")]
    UnrecognizedType(String),

    #[error("Type {0} not found")]
    TypeNotFound(String),

    #[error("Type {0} isn't an interface or dictionary")]
    NotAnInterfaceOrDictionary(String),

    #[error("Unexpected type {0}")]
    UnexpectedType(String),

    #[error("Unexpected global object")]
    UnexpectedGlobalObject,

    #[error("Multiple 'Exposed' extended attributes on {0}")]
    MultipleExposed(String),

    #[error("Partial {name} {kind} is exposed to '{global}', the original {kind} is not.")]
    PartialExposureNotSubset {
        name: String,
        kind: String,
        global: String,
    },

    #[error("Invalid IDL: {0}")]
    InvalidIdl(String),

    #[error("{0} has no interface object due to LegacyNoInterfaceObject")]
    NoInterfaceObject(String),

    #[error("Interface {interface} not found (inherited by {name})")]
    InterfaceNotFound { interface: String, name: String },

    #[error("Invalid object member name {0}")]
    InvalidObjectMember(String),

    #[error("Invalid namespace member {name}: {kind} not supported")]
    InvalidNamespaceMember { name: String, kind: String },

    #[error("Dependency closure did not settle after {0} steps")]
    DependencyClosureDiverged(usize),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("did not throw the expected IdlHarnessError")]
    DidNotThrow,

    #[error("threw \"{actual}\", not the expected IdlHarnessError \"{expected}\"")]
    WrongError { actual: String, expected: String },

    #[error(transparent)]
    Ast(#[from] idlh_ast::AstError),
}

/// A conformance assertion that did not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AssertionError {
    pub message: String,
}

impl AssertionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// How a generated check can end other than passing.
#[derive(Debug, Error)]
pub enum Failure {
    #[error(transparent)]
    Assertion(#[from] AssertionError),

    #[error("IdlHarnessError: {0}")]
    Harness(#[from] HarnessError),

    /// The host threw where no exception was expected. The runner renders
    /// the thrown value through the realm.
    #[error("uncaught exception")]
    Thrown(Thrown),
}

impl From<Thrown> for Failure {
    fn from(thrown: Thrown) -> Self {
        Self::Thrown(thrown)
    }
}

impl Failure {
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(AssertionError::new(message))
    }

    pub const fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
pub type CheckResult<T = ()> = Result<T, Failure>;
