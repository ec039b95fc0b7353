//! Formulary Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Formulary
//! expression compiler. It includes:
//!
//! - **Spans and tokens**: Source locations ([`span::Span`]) and the token
//!   model ([`token::Token`]) including the missing-operand placeholder
//! - **Patterns**: The lexical configuration ([`patterns::PatternRegistry`])
//! - **Domain**: The value and type family expressions compute with
//!   ([`domain::Domain`])
//! - **Functions**: Call shapes, constraints and definitions ([`function`] module)
//! - **Catalog**: The registry of callables and argument-count rules
//!   ([`catalog::Catalog`])

pub mod catalog;
pub mod domain;
pub mod function;
pub mod patterns;
pub mod span;
pub mod token;
