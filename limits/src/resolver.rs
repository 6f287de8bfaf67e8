//! Software position limits referenced from the robot description.
//!
//! Simulator plugin elements (`<gazebo><plugin name="...">`) may carry a
//! `<yarpConfigurationFile>` reference to a control-board configuration.
//! The ones whose name contains a requested body-part fragment are loaded
//! and their `jointNames`/`jntPosMin`/`jntPosMax` lists are zipped into a
//! joint name to `(min, max)` map, in degrees.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::LimitsError;
use crate::value_parser::ConfigDocument;

pub const JOINT_NAMES: &str = "jointNames";
pub const POSITION_MIN: &str = "jntPosMin";
pub const POSITION_MAX: &str = "jntPosMax";

/// A plugin element that references an external configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginConfig {
    pub name: String,
    pub reference: String,
}

/// Collect every `<plugin>` inside a `<gazebo>` element that has a `name`
/// attribute and a `<yarpConfigurationFile>` child.
pub fn extract_plugins(xml: &str) -> Result<Vec<PluginConfig>, LimitsError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut plugins = Vec::new();
    let mut gazebo_depth = 0usize;
    let mut plugin: Option<String> = None;
    let mut in_reference = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"gazebo" => gazebo_depth += 1,
                b"plugin" if gazebo_depth > 0 => plugin = get_attribute_opt(&e, "name"),
                b"yarpConfigurationFile" => in_reference = plugin.is_some(),
                _ => {}
            },
            Ok(Event::Text(text)) if in_reference => {
                let reference = text
                    .unescape()
                    .map_err(|e| LimitsError::Xml(e.to_string()))?;
                if let Some(name) = &plugin {
                    plugins.push(PluginConfig {
                        name: name.clone(),
                        reference: reference.trim().to_string(),
                    });
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"gazebo" => gazebo_depth = gazebo_depth.saturating_sub(1),
                b"plugin" => plugin = None,
                b"yarpConfigurationFile" => in_reference = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(LimitsError::Xml(e.to_string())),
        }
        buf.clear();
    }

    Ok(plugins)
}

/// Turn a plugin reference such as `model://robot/conf/left_arm.ini` into a
/// path, relative references being taken from `search_path`.
pub fn resolve_reference(reference: &str, search_path: &Path) -> PathBuf {
    let relative = reference
        .split_once("://")
        .map_or(reference, |(_, rest)| rest);
    let path = Path::new(relative);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        search_path.join(path)
    }
}

/// Software limits per joint name, in the configuration's unit (degrees).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoftwareLimits {
    limits: HashMap<String, (f64, f64)>,
}

impl SoftwareLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, joint: &str) -> Option<(f64, f64)> {
        self.limits.get(joint).copied()
    }

    /// Record a limit; a later insert for the same joint wins.
    pub fn insert(&mut self, joint: impl Into<String>, min: f64, max: f64) {
        let joint = joint.into();
        if let Some(previous) = self.limits.insert(joint.clone(), (min, max)) {
            debug!("software limits for {joint} replace {previous:?}");
        }
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, (f64, f64))> {
        self.limits.iter().map(|(name, &range)| (name.as_str(), range))
    }

    /// Merge the limits listed in one configuration document.
    pub fn extend_from_document(&mut self, doc: &ConfigDocument) -> Result<usize, LimitsError> {
        let names = doc.identifiers(JOINT_NAMES)?;
        let mins = doc.numbers(POSITION_MIN)?;
        let maxs = doc.numbers(POSITION_MAX)?;
        if names.len() != mins.len() || names.len() != maxs.len() {
            return Err(LimitsError::LengthMismatch {
                path: doc.path.clone(),
                joints: names.len(),
                min: mins.len(),
                max: maxs.len(),
            });
        }
        for ((name, &min), &max) in names.iter().zip(mins).zip(maxs) {
            self.insert(name.as_str(), min, max);
        }
        Ok(names.len())
    }
}

/// Resolve the software limits of every plugin whose name contains one of
/// `body_parts`. Any unreadable or incomplete document fails the whole
/// resolution.
pub fn resolve_software_limits(
    xml: &str,
    body_parts: &[String],
    search_path: &Path,
) -> Result<SoftwareLimits, LimitsError> {
    let mut limits = SoftwareLimits::new();
    if body_parts.is_empty() {
        return Ok(limits);
    }

    for plugin in extract_plugins(xml)? {
        if !body_parts.iter().any(|part| plugin.name.contains(part.as_str())) {
            continue;
        }
        let path = resolve_reference(&plugin.reference, search_path);
        let doc = ConfigDocument::read(&path)?;
        let count = limits.extend_from_document(&doc)?;
        info!(
            "plugin {} provides software limits for {count} joints from {}",
            plugin.name,
            path.display()
        );
    }

    Ok(limits)
}

fn get_attribute_opt(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return String::from_utf8(attr.value.to_vec()).ok();
        }
    }
    None
}
