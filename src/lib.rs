//! scribe: manuscript assistant and knowledge-vault agent
//!
//! Two applications share one crate. The manuscript side stores projects,
//! chapters and scenes in SQLite and uses an LLM to expand, edit, research and
//! export prose; it also hosts the client-report agent that files meeting
//! reports into a workspace tool. The vault side ingests files into a Markdown
//! knowledge vault and writes relationship, research and export reports.

pub mod agent;
pub mod cli;
pub mod config;
pub mod domain;
pub mod export;
pub mod llm;
pub mod server;
pub mod services;
pub mod store;
pub mod utils;
pub mod vault;
pub mod workspace;
