// Relational-algebra IR and the projection-equivalence rewriter.
//
// | Module | Responsibility |
// |--------|----------------|
// | [`token`] | Tagged postfix IR tokens: operator, operand, attribute-set, condition |
// | [`attrs`] | Attribute-set utilities the rewriter's pattern tests are built from |
// | [`rewriter`] | The single forward-pass projection rewriter |

pub mod attrs;
pub mod rewriter;
pub mod token;

pub use rewriter::{rewrite, RewriteError};
pub use token::{AlgebraToken, AttributeSet, OpKind, PostfixExpr, TableName};
