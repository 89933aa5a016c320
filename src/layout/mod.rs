//! Layout detection: projection-based (default) and feature-based
//! (escalation) variants behind the [`LayoutAnalyzer`] seam.
//!
//! [`LayoutAnalyzer`]: crate::core::traits::LayoutAnalyzer

pub mod feature;
pub mod projection;

use crate::core::config::LayoutVariant;
use crate::core::traits::LayoutAnalyzer;

pub use feature::FeatureLayoutDetector;
pub use projection::ProjectionLayoutDetector;

/// Builds the detector a configuration asks for.
pub fn analyzer_for(variant: LayoutVariant) -> Box<dyn LayoutAnalyzer> {
    match variant {
        LayoutVariant::Projection => Box::new(ProjectionLayoutDetector::new()),
        LayoutVariant::Feature => Box::new(FeatureLayoutDetector::new()),
    }
}
