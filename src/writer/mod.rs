//! Binary serialization: object syntax, content fragments, and the
//! document compiler with its cross-reference table and trailer.

pub(crate) mod compiler;
pub(crate) mod content;
pub(crate) mod serializer;

pub(crate) use compiler::compile;
