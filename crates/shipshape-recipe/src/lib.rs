//! # shipshape-recipe
//!
//! Parser for container build recipes (Dockerfiles).
//!
//! Transforms raw recipe text into a typed, validated [`ast::Recipe`]
//! through three phases:
//! - **Lexer**: logical-line assembly (comments, continuations, keywords).
//! - **Parser**: per-instruction recursive descent into the AST.
//! - **Validator**: semantic checks over the assembled stages.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod validator;

pub use ast::{Recipe, Stage};
pub use parser::parse_recipe;
