pub mod lexer;
pub mod scanner;

pub use lexer::{join_tokens, tokenize, Token, TokenKind};
pub use scanner::{Annotation, ClassNode, FieldNode, Import, MethodNode, SourceUnit, Statement};
