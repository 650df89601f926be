//! # picsy-core
//!
//! PICSY: a contribution economy where standing is earned through mutual
//! evaluation instead of fixed prices.
//!
//! ---
//!
//! ## The model
//!
//! Every member holds one row of a row-stochastic **evaluation matrix** `E`.
//! `E[i][j]` is how much of member `i`'s evaluation flows to `j`; the diagonal
//! `E[i][i]` is what `i` keeps back as a spendable **self-budget**.
//!
//! A member's **contribution** is the weight the whole community's evaluations
//! route to them at equilibrium. It is computed, never stored: hand each
//! self-budget out to everybody else (the virtual central bank), then take the
//! dominant left eigenvector by power iteration and scale it so the
//! contributions sum to `N`.
//!
//! Buying something spends self-budget. A price `δ` costs the buyer
//! `α = δ / c_buyer` of their diagonal, moved onto the seller, so members the
//! community values highly pay less evaluation for the same price.
//!
//! ## The pipeline
//!
//! ```text
//! request → economy::{settle, onboard, recover, charter}  → new Matrix
//!                         ↑ borrows                           ↓ commit under one lock
//!                  EvaluationState  ←────────────── Community ──→ StateView
//!                                                      ↓
//!                                             ContributionSolver (VCB + power iteration)
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`matrix`] | [`Matrix`] | Dense square matrix with compensated row normalization |
//! | [`solver`] | [`ContributionSolver`], [`Contributions`] | VCB transform, power iteration, purchasing power |
//! | [`member`] | [`Member`], [`MemberId`] | Stable identities, kind and ghost status |
//! | [`state`] | [`EvaluationState`] | Matrix plus member arena and id map, always the same size |
//! | [`economy`] | [`Transaction`], [`CompanyCharter`], [`Decomposition`] | Pure, invariant-preserving operations |
//! | [`community`] | [`Community`], [`StateView`] | Thread-safe façade that validates, commits and reports |
//! | [`config`] | [`EngineConfig`] | Solver settings, tolerances, seed community (TOML with `config`) |
//! | [`snapshot`] | [`snapshot::CommunitySnapshot`] | Serializable committed state (requires `serde`) |
//!
//! ## Example
//!
//! ```rust
//! use picsy_core::{Community, MemberId, Transaction};
//!
//! let community = Community::default();
//! let view = community
//!     .transact(Transaction { buyer: MemberId::new(1), seller: MemberId::new(2), price: 0.05 })
//!     .unwrap();
//! let total: f64 = view.contributions.iter().sum();
//! assert!((total - 3.0).abs() < 1e-6);
//! ```
//!
//! ## Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `serde` | `Serialize`/`Deserialize` on public types, [`snapshot`] |
//! | `config` | TOML loading for [`EngineConfig`] |
//! | `python-ffi` | `picsy_core` Python module via PyO3 |
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber. Commits
//! log at `info`, rejections at `warn`, solver diagnostics at `debug`.
//!
//! ## License
//!
//! Business Source License 1.1.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod community;
pub mod config;
pub mod economy;
pub mod error;
pub mod matrix;
pub mod member;
pub mod solver;
pub mod state;
#[cfg(feature = "serde")]
pub mod snapshot;

#[cfg(feature = "python-ffi")]
pub mod ffi;

pub use community::{Community, StateView};
pub use config::{ConfigError, EngineConfig, SeedConfig, SolverConfig};
pub use economy::{
    CompanyCharter, Decomposition, Founder, Outflow, Tolerances, Transaction, MAX_COMPANY_BUDGET,
};
pub use error::{PicsyError, Result};
pub use matrix::Matrix;
pub use member::{Member, MemberId, MemberKind, MemberStatus};
pub use solver::{purchasing_power, ContributionSolver, Contributions};
pub use state::EvaluationState;
