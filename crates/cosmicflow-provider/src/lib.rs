//! Cosmic cloud provider for cosmicflow
//!
//! Translates the declarative attributes of every `cosmic_*` resource kind
//! into calls against the Cosmic control plane, which is reached through the
//! [`CosmicApi`] trait.
//!
//! # Resource kinds
//!
//! - Rule collections (`port_forward`, `network_acl_rule`) reconciled in
//!   parallel batches
//! - Networking (`vpc`, `network`, `network_acl`, `ipaddress`, `static_nat`,
//!   `static_route`, `private_gateway`, `loadbalancer_rule`)
//! - Site-to-site VPN (`vpn_gateway`, `vpn_customer_gateway`, `vpn_connection`)
//! - Compute (`instance`, `disk`, `nic`, `secondary_ipaddress`,
//!   `affinity_group`, `ssh_keypair`, `template`)
//!
//! # Example
//!
//! ```ignore
//! use cosmicflow_provider::{CosmicProvider, ResourceKind};
//!
//! let provider = CosmicProvider::new(api, Arc::new(config));
//! let kind: ResourceKind = "cosmic_vpc".parse()?;
//!
//! let result = provider.create(kind, attrs).await;
//! if let Some(state) = result.state {
//!     host.persist(state);
//! }
//! ```

pub mod api;
pub mod data_source;
pub mod kind;
pub mod logging;
pub mod lookup;
pub mod provider;
pub mod resources;
pub mod rules;

pub use api::{ApiResult, CosmicApi, LookupKind};
pub use data_source::{Filter, NetworkAclData};
pub use kind::ResourceKind;
pub use logging::init_tracing;
pub use provider::CosmicProvider;
pub use resources::{Resource, ResourceContext};
pub use rules::{AclRule, AclRuleBlock, PortForward};
