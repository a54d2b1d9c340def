pub(crate) mod declaration;
pub(crate) mod expression;
pub(crate) mod statement;
