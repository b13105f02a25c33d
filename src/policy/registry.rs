use crate::policy::error::PolicyResult;
use crate::policy::types::{FileCategory, UploadPolicy};

const MIB: u64 = 1024 * 1024;

/// Static mapping from category to upload policy.
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    image: UploadPolicy,
    video: UploadPolicy,
    audio: UploadPolicy,
    document: UploadPolicy,
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self {
            image: UploadPolicy::new(
                [
                    "image/jpeg",
                    "image/png",
                    "image/gif",
                    "image/webp",
                    "image/svg+xml",
                ],
                10 * MIB,
            ),
            video: UploadPolicy::new(["video/*"], 100 * MIB),
            audio: UploadPolicy::new(["audio/*"], 20 * MIB),
            document: UploadPolicy::new(
                [
                    "application/pdf",
                    "application/msword",
                    "application/vnd.openxmlformats-officedocument.*",
                    "application/vnd.ms-excel",
                    "application/vnd.ms-powerpoint",
                    "text/plain",
                    "text/csv",
                    "application/zip",
                ],
                10 * MIB,
            ),
        }
    }
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the policy for one category
    pub fn with_policy(mut self, category: FileCategory, policy: UploadPolicy) -> Self {
        *self.slot_mut(category) = policy;
        self
    }

    pub fn policy_for(&self, category: FileCategory) -> &UploadPolicy {
        match category {
            FileCategory::Image => &self.image,
            FileCategory::Video => &self.video,
            FileCategory::Audio => &self.audio,
            FileCategory::Document => &self.document,
        }
    }

    /// Look up a policy by category name.
    ///
    /// Fails with `UnknownCategory` for names outside the four known categories;
    /// use [`FileCategory::resolve`] to fall back to `document` instead.
    pub fn policy_for_name(&self, name: &str) -> PolicyResult<&UploadPolicy> {
        let category: FileCategory = name.parse()?;
        Ok(self.policy_for(category))
    }

    fn slot_mut(&mut self, category: FileCategory) -> &mut UploadPolicy {
        match category {
            FileCategory::Image => &mut self.image,
            FileCategory::Video => &mut self.video,
            FileCategory::Audio => &mut self.audio,
            FileCategory::Document => &mut self.document,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyError;

    #[test]
    fn test_default_policies() {
        let registry = PolicyRegistry::default();

        for category in FileCategory::ALL {
            let policy = registry.policy_for(category);
            assert!(policy.max_bytes > 0);
            assert!(!policy.accepted_patterns.is_empty());
        }

        assert_eq!(registry.policy_for(FileCategory::Video).max_bytes, 100 * MIB);
    }

    #[test]
    fn test_override_policy() {
        let registry = PolicyRegistry::default()
            .with_policy(FileCategory::Image, UploadPolicy::new(["image/png"], 512));

        let policy = registry.policy_for(FileCategory::Image);
        assert_eq!(policy.max_bytes, 512);
        assert_eq!(policy.accepted_patterns, vec!["image/png".to_string()]);
    }

    #[test]
    fn test_policy_for_unknown_name() {
        let registry = PolicyRegistry::default();

        assert!(registry.policy_for_name("audio").is_ok());
        assert_eq!(
            registry.policy_for_name("hologram").unwrap_err(),
            PolicyError::UnknownCategory("hologram".into())
        );
    }
}
