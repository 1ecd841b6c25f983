//! Centralized limits and thresholds for the harness.
//!
//! Every loop in the registry that follows user-supplied references (base
//! interfaces, typedef chains, dependency edges) is bounded by one of these
//! constants. Exceeding a limit is reported as a harness error rather than
//! looping forever or overflowing the stack.

// =============================================================================
// Iteration Limits
// =============================================================================

/// Maximum number of declaration visits during dependency closure.
///
/// `add_dependency_idls` re-processes deferred declarations whenever a later
/// declaration turns their name into a dependency. Each deferred entry is
/// removed before it is re-processed, so well-formed input converges in at
/// most `declarations * names` visits; this cap turns a pathological batch
/// into an error instead of a hang.
///
/// # IDL example
///
/// ```webidl
/// // Mutual forward references spread over one dependency batch:
/// interface A : B {};
/// interface B : C {};
/// interface C {};
/// partial interface A { attribute D d; };
/// dictionary D {};
/// ```
pub const MAX_DEPENDENCY_STEPS: usize = 100_000;

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum length of an inheritance chain.
///
/// Cycles are detected explicitly by the inheritance stack walk; this bound
/// only protects against absurdly deep (but acyclic) hierarchies.
pub const MAX_INHERITANCE_DEPTH: usize = 512;

/// Maximum nesting of typedef resolution and nested generic/union types
/// while checking a value against a declared type.
///
/// # IDL example
///
/// ```webidl
/// typedef sequence<sequence<(long or sequence<DOMString>)>> Matrix;
/// typedef Matrix Grid;
/// ```
pub const MAX_TYPE_NESTING_DEPTH: u32 = 128;
