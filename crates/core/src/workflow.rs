// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow model and transition lookup.
//!
//! Workflows come from configuration and are read-only for the life of a
//! session. They exist for exactly one purpose: answering which named
//! transition moves an issue from one linked status to another.

use serde::Deserialize;

/// A configuration-defined workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub name: String,
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
    #[serde(default, rename = "resolution_transition")]
    pub resolution_transitions: Vec<ResolutionTransition>,
}

/// A workflow step, linked to a remote status.
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    pub name: String,
    pub linked_status: String,
    #[serde(default, rename = "transition")]
    pub transitions: Vec<Transition>,
}

/// A named transition from its owning step to a destination step.
#[derive(Debug, Clone, Deserialize)]
pub struct Transition {
    pub name: String,
    pub destination_step: String,
}

/// A transition that requires a resolution when executed.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolutionTransition {
    pub name: String,
}

/// Looks up transitions between linked statuses across a workflow set.
pub struct TransitionMatcher<'a> {
    workflows: &'a [Workflow],
}

impl<'a> TransitionMatcher<'a> {
    pub fn new(workflows: &'a [Workflow]) -> Self {
        TransitionMatcher { workflows }
    }

    /// All transition names that move `from_status` to `to_status`, in
    /// configuration order.
    ///
    /// A step matches `from_status` by its linked status
    /// (case-insensitive, trimmed). A transition matches `to_status` if
    /// its destination step name resolves — anywhere in the workflow set,
    /// not just the owning workflow — to a step whose linked status
    /// equals `to_status`.
    pub fn matching_transitions(&self, from_status: &str, to_status: &str) -> Vec<&'a str> {
        let mut names: Vec<&'a str> = Vec::new();
        for workflow in self.workflows {
            for step in &workflow.steps {
                if !eq_trimmed(&step.linked_status, from_status) {
                    continue;
                }
                for transition in &step.transitions {
                    if self.step_has_linked_status(&transition.destination_step, to_status)
                        && !names.contains(&transition.name.as_str())
                    {
                        names.push(transition.name.as_str());
                    }
                }
            }
        }
        names
    }

    /// The first transition that moves `from_status` to `to_status`, if
    /// any. When several transitions qualify, configuration order decides.
    pub fn find_transition(&self, from_status: &str, to_status: &str) -> Option<&'a str> {
        self.matching_transitions(from_status, to_status)
            .into_iter()
            .next()
    }

    fn step_has_linked_status(&self, step_name: &str, linked_status: &str) -> bool {
        self.workflows.iter().any(|workflow| {
            workflow.steps.iter().any(|step| {
                eq_trimmed(&step.name, step_name) && eq_trimmed(&step.linked_status, linked_status)
            })
        })
    }
}

/// Statuses reachable through any resolution transition of any workflow.
///
/// Computed once at configuration load; a status in this set participates
/// in status/resolution combination fields.
pub fn resolution_statuses(workflows: &[Workflow]) -> Vec<String> {
    let mut statuses: Vec<String> = Vec::new();
    for workflow in workflows {
        for rt in &workflow.resolution_transitions {
            let Some(step_name) = step_for_transition(workflow, &rt.name) else {
                continue;
            };
            let Some(status) = status_for_step(workflow, step_name) else {
                continue;
            };
            if !statuses.iter().any(|s| s == status) {
                statuses.push(status.to_string());
            }
        }
    }
    statuses
}

/// Destination step of the first transition with the given name.
fn step_for_transition<'a>(workflow: &'a Workflow, transition_name: &str) -> Option<&'a str> {
    for step in &workflow.steps {
        for transition in &step.transitions {
            if eq_trimmed(&transition.name, transition_name) {
                return Some(&transition.destination_step);
            }
        }
    }
    None
}

/// Linked status of the step with the given name.
fn status_for_step<'a>(workflow: &'a Workflow, step_name: &str) -> Option<&'a str> {
    workflow
        .steps
        .iter()
        .find(|step| eq_trimmed(&step.name, step_name))
        .map(|step| step.linked_status.as_str())
}

fn eq_trimmed(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
