//! Framework detection from page globals.
//!
//! Detection is a table of named rules evaluated in order; the first rule
//! with a matching probe wins. Base framework and meta-framework are decided
//! independently.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// UI framework rendering the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseFramework {
    React,
    Vue,
}

impl fmt::Display for BaseFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::React => f.write_str("React"),
            Self::Vue => f.write_str("Vue"),
        }
    }
}

/// Routing/rendering framework layered on top of the base framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaFramework {
    #[serde(rename = "Next.js (Pages Router)")]
    NextPages,
    #[serde(rename = "Next.js (App Router)")]
    NextApp,
    /// Next.js recognized from its DOM footprint only
    #[serde(rename = "Next.js")]
    Next,
    #[serde(rename = "Nuxt")]
    Nuxt,
}

impl fmt::Display for MetaFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NextPages => f.write_str("Next.js (Pages Router)"),
            Self::NextApp => f.write_str("Next.js (App Router)"),
            Self::Next => f.write_str("Next.js"),
            Self::Nuxt => f.write_str("Nuxt"),
        }
    }
}

/// What the page appears to be built with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameworkSignal {
    #[serde(rename = "framework")]
    pub base: Option<BaseFramework>,
    #[serde(rename = "metaFramework")]
    pub meta: Option<MetaFramework>,
}

/// Read access to page state used by the detection rules. Every probe may
/// fail (a throwing getter, a detached frame); failures count as absence.
pub trait PageProbe {
    /// Whether `window[name]` is truthy
    fn has_global(&self, name: &str) -> Result<bool>;

    /// Whether `document.getElementById(id)` finds an element
    fn has_element_id(&self, id: &str) -> Result<bool>;

    /// Whether some `<script src>` contains `fragment`
    fn has_script_src(&self, fragment: &str) -> Result<bool>;
}

/// One check against the page
#[derive(Debug, Clone, Copy)]
pub enum Probe {
    Global(&'static str),
    ElementId(&'static str),
    ScriptSrc(&'static str),
    /// Every listed probe must hold
    All(&'static [Probe]),
}

/// A verdict reached when any of its probes holds
#[derive(Debug, Clone, Copy)]
pub struct Rule<T: 'static> {
    pub name: &'static str,
    pub verdict: T,
    pub any_of: &'static [Probe],
}

pub const BASE_RULES: &[Rule<BaseFramework>] = &[
    Rule {
        name: "react-devtools-hook",
        verdict: BaseFramework::React,
        any_of: &[Probe::Global("__REACT_DEVTOOLS_GLOBAL_HOOK__")],
    },
    Rule {
        name: "vue-global",
        verdict: BaseFramework::Vue,
        any_of: &[Probe::Global("__VUE__"), Probe::Global("__vue__")],
    },
];

pub const META_RULES: &[Rule<MetaFramework>] = &[
    Rule {
        name: "next-pages-data",
        verdict: MetaFramework::NextPages,
        any_of: &[Probe::Global("__NEXT_DATA__")],
    },
    Rule {
        name: "next-app-router",
        verdict: MetaFramework::NextApp,
        any_of: &[Probe::Global("__next_f"), Probe::Global("__next_router_prefetch_for")],
    },
    Rule {
        name: "next-root-and-chunks",
        verdict: MetaFramework::Next,
        any_of: &[Probe::All(&[Probe::ElementId("__next"), Probe::ScriptSrc("/_next/")])],
    },
    Rule {
        name: "nuxt",
        verdict: MetaFramework::Nuxt,
        any_of: &[
            Probe::Global("__NUXT__"),
            Probe::Global("__NUXT_DATA__"),
            Probe::ElementId("__nuxt"),
            Probe::ElementId("__layout"),
        ],
    },
];

/// Classify the page; `None` when neither a base nor a meta framework shows
pub fn detect_framework(probe: &impl PageProbe) -> Option<FrameworkSignal> {
    let base = first_match(BASE_RULES, probe);
    let meta = first_match(META_RULES, probe);

    if base.is_none() && meta.is_none() {
        return None;
    }
    Some(FrameworkSignal { base, meta })
}

/// Every global any rule reads, for exporters that must read them up front
pub fn probed_globals() -> Vec<&'static str> {
    fn collect(probes: &[Probe], out: &mut Vec<&'static str>) {
        for probe in probes {
            match probe {
                Probe::Global(name) if !out.contains(name) => out.push(*name),
                Probe::All(inner) => collect(inner, out),
                _ => {}
            }
        }
    }

    let mut names = Vec::new();
    for rule in BASE_RULES {
        collect(rule.any_of, &mut names);
    }
    for rule in META_RULES {
        collect(rule.any_of, &mut names);
    }
    names
}

fn first_match<T: Copy>(rules: &[Rule<T>], probe: &impl PageProbe) -> Option<T> {
    rules
        .iter()
        .find(|rule| rule.any_of.iter().any(|p| holds(p, probe)))
        .map(|rule| {
            log::debug!("Framework rule '{}' matched", rule.name);
            rule.verdict
        })
}

fn holds(check: &Probe, probe: &impl PageProbe) -> bool {
    let outcome = match check {
        Probe::Global(name) => probe.has_global(name),
        Probe::ElementId(id) => probe.has_element_id(id),
        Probe::ScriptSrc(fragment) => probe.has_script_src(fragment),
        Probe::All(inner) => return inner.iter().all(|p| holds(p, probe)),
    };

    outcome.unwrap_or_else(|e| {
        log::debug!("Probe {:?} failed, treating as absent: {}", check, e);
        false
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrowserError;

    #[derive(Default)]
    struct FakePage {
        globals: Vec<&'static str>,
        ids: Vec<&'static str>,
        scripts: Vec<&'static str>,
        throwing: Vec<&'static str>,
    }

    impl PageProbe for FakePage {
        fn has_global(&self, name: &str) -> Result<bool> {
            if self.throwing.iter().any(|g| *g == name) {
                return Err(BrowserError::EvaluationFailed(format!("getter for {} threw", name)));
            }
            Ok(self.globals.iter().any(|g| *g == name))
        }

        fn has_element_id(&self, id: &str) -> Result<bool> {
            Ok(self.ids.iter().any(|i| *i == id))
        }

        fn has_script_src(&self, fragment: &str) -> Result<bool> {
            Ok(self.scripts.iter().any(|src| src.contains(fragment)))
        }
    }

    #[test]
    fn test_nothing_detected() {
        assert_eq!(detect_framework(&FakePage::default()), None);
    }

    #[test]
    fn test_react_wins_over_vue() {
        let page = FakePage {
            globals: vec!["__VUE__", "__REACT_DEVTOOLS_GLOBAL_HOOK__"],
            ..Default::default()
        };
        let signal = detect_framework(&page).unwrap();
        assert_eq!(signal.base, Some(BaseFramework::React));
        assert_eq!(signal.meta, None);
    }

    #[test]
    fn test_vue2_global() {
        let page = FakePage {
            globals: vec!["__vue__"],
            ..Default::default()
        };
        assert_eq!(detect_framework(&page).unwrap().base, Some(BaseFramework::Vue));
    }

    #[test]
    fn test_next_pages_before_app_router() {
        let page = FakePage {
            globals: vec!["__REACT_DEVTOOLS_GLOBAL_HOOK__", "__next_f", "__NEXT_DATA__"],
            ..Default::default()
        };
        let signal = detect_framework(&page).unwrap();
        assert_eq!(signal.meta, Some(MetaFramework::NextPages));
    }

    #[test]
    fn test_next_dom_footprint_needs_both_probes() {
        let root_only = FakePage {
            ids: vec!["__next"],
            ..Default::default()
        };
        assert_eq!(detect_framework(&root_only), None);

        let both = FakePage {
            ids: vec!["__next"],
            scripts: vec!["https://cdn.test/_next/static/chunks/main.js"],
            ..Default::default()
        };
        let signal = detect_framework(&both).unwrap();
        assert_eq!(signal, FrameworkSignal { base: None, meta: Some(MetaFramework::Next) });
    }

    #[test]
    fn test_nuxt_layout_element() {
        let page = FakePage {
            globals: vec!["__VUE__"],
            ids: vec!["__layout"],
            ..Default::default()
        };
        let signal = detect_framework(&page).unwrap();
        assert_eq!(signal.base, Some(BaseFramework::Vue));
        assert_eq!(signal.meta, Some(MetaFramework::Nuxt));
    }

    #[test]
    fn test_throwing_probe_counts_as_absent() {
        let page = FakePage {
            globals: vec!["__REACT_DEVTOOLS_GLOBAL_HOOK__", "__VUE__"],
            throwing: vec!["__REACT_DEVTOOLS_GLOBAL_HOOK__"],
            ..Default::default()
        };
        assert_eq!(detect_framework(&page).unwrap().base, Some(BaseFramework::Vue));
    }

    #[test]
    fn test_probed_globals() {
        let globals = probed_globals();
        assert_eq!(globals[0], "__REACT_DEVTOOLS_GLOBAL_HOOK__");
        assert!(globals.contains(&"__NUXT_DATA__"));
        assert!(globals.contains(&"__next_router_prefetch_for"));
        assert_eq!(globals.len(), 8);
    }

    #[test]
    fn test_wire_shape() {
        let signal = FrameworkSignal {
            base: Some(BaseFramework::React),
            meta: Some(MetaFramework::NextApp),
        };
        assert_eq!(
            serde_json::to_value(signal).unwrap(),
            serde_json::json!({"framework": "React", "metaFramework": "Next.js (App Router)"})
        );
        assert_eq!(MetaFramework::NextApp.to_string(), "Next.js (App Router)");
    }
}
