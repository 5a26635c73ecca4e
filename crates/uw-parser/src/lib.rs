//! The Uhrwerk command interpreter.
//!
//! Input flows through four stages: [`lexer::lex`] splits a line into
//! words, the [`Vocabulary`] tags them, the [`Grammar`] picks the first rule
//! whose pattern fits, and noun phrases are resolved against what the actor
//! can see in the [`uw_core::World`].
//!
//! ```
//! use uw_core::{Entity, EntityId, EntityKind, World, WorldMeta};
//! use uw_parser::{Interpreter, ResolveContext};
//!
//! let mut world = World::new(WorldMeta::new("Demo"));
//! world.add_entity(Entity::new("hall", EntityKind::Location, "Hall")).unwrap();
//! world.add_entity(Entity::new("me", EntityKind::Player, "yourself")).unwrap();
//! world.place(&"me".into(), &"hall".into()).unwrap();
//!
//! let interpreter = Interpreter::standard();
//! let actor = EntityId::new("me");
//! let command = interpreter
//!     .interpret("look", &world, &ResolveContext::new(&actor))
//!     .unwrap();
//! assert_eq!(command.action, "look");
//! ```

/// Resolved commands.
pub mod command;
/// Parse failures and grammar authoring errors.
pub mod error;
/// Grammar rules and pattern matching elements.
pub mod grammar;
/// The interpreter pipeline.
pub mod interpreter;
/// Tokenizer for player input.
pub mod lexer;
/// Noun phrase resolution and disambiguation.
pub mod resolver;
/// Word lookup tables.
pub mod vocabulary;

pub use command::Command;
pub use error::{GrammarError, ParseFailure, ParseResult};
pub use grammar::{Grammar, GrammarRule, Locality, PatternElement};
pub use interpreter::Interpreter;
pub use resolver::{Ambiguity, ResolveContext};
pub use vocabulary::{Sense, Target, Vocabulary, WordRole};
