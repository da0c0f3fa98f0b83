//! CRD YAML Generator
//!
//! This binary generates the Kubernetes CRD manifest for the SecurityGroup
//! resource managed by the security-group-operator.
//!
//! Usage: cargo run --bin crdgen > deploy/crds/securitygroup.yaml

use security_group_operator::crd::generate_crds;

fn main() -> anyhow::Result<()> {
    for crd in generate_crds()? {
        println!("---");
        print!("{}", crd);
    }
    Ok(())
}
