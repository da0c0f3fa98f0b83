//! Finalizer handling for SecurityGroup resources
//!
//! The finalizer is added before anything is created in the management
//! service and removed only once the security group there is gone.

/// Finalizer name for SecurityGroup resources
pub const SECURITY_GROUP_FINALIZER: &str = "securitygroup.finalizers.paas.unicom.cn";

/// Whether `finalizers` contains `token`
pub fn has_finalizer(finalizers: &[String], token: &str) -> bool {
    finalizers.iter().any(|f| f == token)
}

/// Add `token` unless it is already present
pub fn add_finalizer(finalizers: &mut Vec<String>, token: &str) {
    if !has_finalizer(finalizers, token) {
        finalizers.push(token.to_string());
    }
}

/// Remove every occurrence of `token`
pub fn remove_finalizer(finalizers: &mut Vec<String>, token: &str) {
    finalizers.retain(|f| f != token);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut finalizers = vec!["other".to_string()];
        add_finalizer(&mut finalizers, SECURITY_GROUP_FINALIZER);
        add_finalizer(&mut finalizers, SECURITY_GROUP_FINALIZER);
        assert_eq!(finalizers.len(), 2);
        assert!(has_finalizer(&finalizers, SECURITY_GROUP_FINALIZER));
    }

    #[test]
    fn test_remove_leaves_other_finalizers() {
        let mut finalizers = vec![
            SECURITY_GROUP_FINALIZER.to_string(),
            "other".to_string(),
            SECURITY_GROUP_FINALIZER.to_string(),
        ];
        remove_finalizer(&mut finalizers, SECURITY_GROUP_FINALIZER);
        assert_eq!(finalizers, vec!["other".to_string()]);
        assert!(!has_finalizer(&finalizers, SECURITY_GROUP_FINALIZER));
    }
}
