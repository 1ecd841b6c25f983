//! Extended attribute names, in current and legacy spelling.
//!
//! WebIDL renamed several attributes with a `Legacy` prefix. Specs in the
//! wild still use both forms, so every lookup passes the whole list.

pub const EXPOSED: &[&str] = &["Exposed"];
pub const GLOBAL: &[&str] = &["Global"];
pub const DEFAULT: &[&str] = &["Default"];
pub const SECURE_CONTEXT: &[&str] = &["SecureContext"];
pub const CONSTRUCTOR: &[&str] = &["Constructor"];
pub const UNSCOPABLE: &[&str] = &["Unscopable"];
pub const PUT_FORWARDS: &[&str] = &["PutForwards"];
pub const REPLACEABLE: &[&str] = &["Replaceable"];
pub const LEGACY_WINDOW_ALIAS: &[&str] = &["LegacyWindowAlias"];
pub const LEGACY_NAMESPACE: &[&str] = &["LegacyNamespace"];
pub const LEGACY_LENIENT_SETTER: &[&str] = &["LegacyLenientSetter", "LenientSetter"];
pub const NO_INTERFACE_OBJECT: &[&str] = &["LegacyNoInterfaceObject", "NoInterfaceObject"];
pub const UNFORGEABLE: &[&str] = &["LegacyUnforgeable", "Unforgeable"];
pub const LENIENT_THIS: &[&str] = &["LegacyLenientThis", "LenientThis"];
pub const FACTORY_FUNCTION: &[&str] = &["LegacyFactoryFunction", "NamedConstructor"];

/// The only extended attributes a namespace may carry.
pub const NAMESPACE_ATTRIBUTES: &[&str] = &["Exposed", "SecureContext"];
