use crate::error::BvhError;

/// Tunables for BVH construction. The defaults are what the traversal
/// shader was tuned against.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BvhConfig {
    /// Ranges with at most this many primitives always become leaves.
    pub max_leaf_size: usize,
    /// Uniform bins per axis for the SAH split search.
    pub bucket_count: usize,
    pub traversal_cost: f32,
    pub intersection_cost: f32,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            max_leaf_size: 4,
            bucket_count: 12,
            traversal_cost: 0.125,
            intersection_cost: 1.0,
        }
    }
}

impl BvhConfig {
    pub fn with_max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        self.max_leaf_size = max_leaf_size;
        self
    }

    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    pub fn validate(&self) -> Result<(), BvhError> {
        if self.max_leaf_size == 0 {
            return Err(BvhError::InvalidConfig(
                "max_leaf_size must be at least 1".to_string(),
            ));
        }

        if self.bucket_count < 2 {
            return Err(BvhError::InvalidConfig(format!(
                "bucket_count must be at least 2, got {}",
                self.bucket_count
            )));
        }

        for (name, cost) in [
            ("traversal_cost", self.traversal_cost),
            ("intersection_cost", self.intersection_cost),
        ] {
            if !cost.is_finite() || cost < 0.0 {
                return Err(BvhError::InvalidConfig(format!(
                    "{name} must be finite and non-negative, got {cost}"
                )));
            }
        }

        Ok(())
    }

    /// Cost of intersecting every primitive of a range directly.
    pub fn leaf_cost(&self, primitive_count: usize) -> f32 {
        primitive_count as f32 * self.intersection_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BvhConfig::default().validate().is_ok());
        assert_eq!(BvhConfig::default().leaf_cost(5), 5.0);
    }

    #[test]
    fn test_rejects_degenerate_config() {
        assert!(BvhConfig::default().with_max_leaf_size(0).validate().is_err());
        assert!(BvhConfig::default().with_bucket_count(1).validate().is_err());

        let config = BvhConfig {
            traversal_cost: f32::NAN,
            ..BvhConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BvhError::InvalidConfig(_))
        ));
    }
}
