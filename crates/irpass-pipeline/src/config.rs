use crate::error::ConfigError;
use crate::pipeliner::PassPipeliner;
use irpass_core::{OptLevel, Pass, PassEngine};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

fn default_opt() -> OptLevel {
    OptLevel::Default
}

fn default_size() -> OptLevel {
    OptLevel::None
}

/// Declarative description of a pipeline, deserializable from JSON.
///
/// ```json
/// {
///   "stages": [
///     { "name": "mandatory", "passes": ["cfg-simplification", "early-cse"] },
///     { "name": "opt", "standard-function": { "opt": "aggressive" } },
///     { "name": "cleanup", "passes": ["global-dce"] }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub stages: Vec<StageSpec>,
}

/// One named stage of a [`PipelineSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: StageKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    /// A pass-list stage; entries are resolved through [`Pass::from_name`].
    Passes(Vec<String>),
    /// A standard function-scoped pipeline for a tuning pair.
    StandardFunction {
        #[serde(default = "default_opt")]
        opt: OptLevel,
        #[serde(default = "default_size")]
        size: OptLevel,
    },
    /// A standard module-scoped pipeline for a tuning pair.
    StandardModule {
        #[serde(default = "default_opt")]
        opt: OptLevel,
        #[serde(default = "default_size")]
        size: OptLevel,
    },
}

impl PipelineSpec {
    /// Parses and validates a JSON pipeline description.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let spec: PipelineSpec = serde_json::from_str(text)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Checks stage-name uniqueness and resolves every referenced pass name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = self.stages.iter().map(|s| &s.name).duplicates().next() {
            return Err(ConfigError::DuplicateStage { name: name.clone() });
        }
        for stage in &self.stages {
            if let StageKind::Passes(names) = &stage.kind {
                for pass in names {
                    if Pass::from_name(pass).is_none() {
                        return Err(ConfigError::UnknownPass {
                            stage: stage.name.clone(),
                            pass: pass.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Registers every described stage onto `pipeliner`, in description
    /// order. Validates first, so a bad description leaves the pipeliner
    /// untouched.
    pub fn apply<E: PassEngine>(
        &self,
        pipeliner: &mut PassPipeliner<'_, E>,
    ) -> Result<(), ConfigError> {
        self.validate()?;
        for stage in &self.stages {
            match &stage.kind {
                StageKind::Passes(names) => {
                    let passes: Vec<Pass> = names
                        .iter()
                        .map(|name| {
                            Pass::from_name(name).ok_or_else(|| ConfigError::UnknownPass {
                                stage: stage.name.clone(),
                                pass: name.clone(),
                            })
                        })
                        .collect::<Result<_, _>>()?;
                    pipeliner.add_stage(&stage.name, |builder| {
                        for pass in passes {
                            builder.add(pass);
                        }
                    });
                }
                StageKind::StandardFunction { opt, size } => {
                    pipeliner.add_standard_function_pipeline(&stage.name, *opt, *size);
                }
                StageKind::StandardModule { opt, size } => {
                    pipeliner.add_standard_module_pipeline(&stage.name, *opt, *size);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_the_three_stage_kinds() {
        let spec = PipelineSpec::from_json(
            r#"{
                "stages": [
                    { "name": "mandatory", "passes": ["cfg-simplification", "early-cse"] },
                    { "name": "opt", "standard-function": { "opt": "aggressive", "size": "less" } },
                    { "name": "cleanup", "standard-module": {} }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(spec.stages.len(), 3);
        assert_eq!(
            spec.stages[1].kind,
            StageKind::StandardFunction {
                opt: OptLevel::Aggressive,
                size: OptLevel::Less,
            }
        );
        // Omitted tuning levels fall back to the standard-pipeline defaults.
        assert_eq!(
            spec.stages[2].kind,
            StageKind::StandardModule {
                opt: OptLevel::Default,
                size: OptLevel::None,
            }
        );
    }

    #[test]
    fn rejects_unknown_pass_names() {
        let err = PipelineSpec::from_json(
            r#"{ "stages": [ { "name": "bad", "passes": ["no-such-pass"] } ] }"#,
        )
        .unwrap_err();
        match err {
            ConfigError::UnknownPass { stage, pass } => {
                assert_eq!(stage, "bad");
                assert_eq!(pass, "no-such-pass");
            }
            other => panic!("expected UnknownPass, got {other}"),
        }
    }

    #[test]
    fn rejects_duplicate_stage_names() {
        let err = PipelineSpec::from_json(
            r#"{
                "stages": [
                    { "name": "twice", "passes": ["gvn"] },
                    { "name": "twice", "passes": ["sccp"] }
                ]
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateStage { name } if name == "twice"));
    }

    #[test]
    fn round_trips_through_json() {
        let spec = PipelineSpec {
            stages: vec![StageSpec {
                name: "mandatory".to_string(),
                kind: StageKind::Passes(vec!["gvn".to_string(), "licm".to_string()]),
            }],
        };
        let text = serde_json::to_string(&spec).unwrap();
        assert_eq!(PipelineSpec::from_json(&text).unwrap(), spec);
    }
}
