//! Composition: rewrite, validate, fall back, assemble.

use std::sync::Arc;

use signalcast_core::{RandomSource, SignalRecord};
use signalcast_extract::{IntegrityReport, Violation, validate};
use tracing::{debug, warn};

use crate::assembler::{finalize, template_body};
use crate::decorations::Decorations;
use crate::rewriter::Rewriter;

/// Where the body of a composed post came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    Rewriter,
    Template,
}

#[derive(Debug, Clone)]
pub struct ComposedPost {
    /// Final text, at most 280 characters.
    pub text: String,
    pub source: BodySource,
    /// Violations of a rejected rewrite, if one was attempted.
    pub violations: Vec<Violation>,
}

pub struct Composer {
    decorations: Decorations,
    rewriter: Option<Arc<dyn Rewriter>>,
}

impl Composer {
    pub fn new(decorations: Decorations) -> Self {
        Self {
            decorations,
            rewriter: None,
        }
    }

    pub fn with_rewriter(mut self, rewriter: Arc<dyn Rewriter>) -> Self {
        self.rewriter = Some(rewriter);
        self
    }

    pub fn decorations(&self) -> &Decorations {
        &self.decorations
    }

    pub fn has_rewriter(&self) -> bool {
        self.rewriter.is_some()
    }

    /// Produce a post for `record`. Any rewrite problem ends in the
    /// template body. The finished text is validated again, and a post that
    /// lost a protected field during assembly is returned as the report.
    pub async fn compose(
        &self,
        record: &SignalRecord,
        rng: &mut dyn RandomSource,
    ) -> Result<ComposedPost, IntegrityReport> {
        let mut violations = Vec::new();

        let candidate = match &self.rewriter {
            Some(rewriter) => match rewriter.rewrite(record).await {
                Ok(body) => {
                    let report = validate(record, &body);
                    if report.is_ok() {
                        Some(body)
                    } else {
                        warn!(
                            rewriter = %rewriter.name(),
                            violations = %report.summary(),
                            "Rewrite dropped protected fields, using template"
                        );
                        violations = report.violations;
                        None
                    }
                }
                Err(e) => {
                    warn!(rewriter = %rewriter.name(), error = %e, "Rewrite failed, using template");
                    None
                }
            },
            None => None,
        };

        let (body, source) = match candidate {
            Some(body) => (body, BodySource::Rewriter),
            None => (
                template_body(record, &self.decorations, rng),
                BodySource::Template,
            ),
        };

        let text = finalize(&body, record, &self.decorations, rng);
        let report = validate(record, &text);
        if !report.is_ok() {
            warn!(
                source = ?source,
                violations = %report.summary(),
                "Finished post lost protected fields"
            );
            return Err(report);
        }
        debug!(source = ?source, chars = text.chars().count(), "Composed post");

        Ok(ComposedPost {
            text,
            source,
            violations,
        })
    }
}
