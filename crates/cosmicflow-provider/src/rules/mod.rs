//! Rule types of the rule-collection resources

pub mod acl;
pub mod port_forward;

pub use acl::{AclRule, AclRuleBlock, AclRuleKey, PortRange};
pub use port_forward::{PortForward, PortForwardKey};
