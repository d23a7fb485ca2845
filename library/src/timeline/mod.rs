//! Layers and clips placed on the composition's time axis.
//!
//! Independent of curve bindings; they only share the same global time.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct Layer {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub clips: Vec<Clip>,
}

impl Layer {
    pub fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            clips: Vec::new(),
        }
    }

    pub fn add_clip(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    /// Insert a clip at a specific index
    pub fn insert_clip(&mut self, index: usize, clip: Clip) {
        if index <= self.clips.len() {
            self.clips.insert(index, clip);
        } else {
            self.clips.push(clip);
        }
    }

    pub fn remove_clip(&mut self, clip_id: Uuid) -> Option<Clip> {
        let pos = self.clips.iter().position(|clip| clip.id == clip_id)?;
        Some(self.clips.remove(pos))
    }

    pub fn get_clip(&self, clip_id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|clip| clip.id == clip_id)
    }

    pub fn get_clip_mut(&mut self, clip_id: Uuid) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|clip| clip.id == clip_id)
    }

    /// Clips covering `time`, in layer order.
    pub fn active_clips(&self, time: f64) -> impl Iterator<Item = &Clip> {
        self.clips.iter().filter(move |clip| clip.is_active_at(time))
    }
}

/// A placement of external content on the timeline.
///
/// `start_time`/`end_time` place the clip; `source_start_time`/`source_end_time`
/// trim the referenced content, which loops when the placement is longer.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct Clip {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    /// ID of the referenced content, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<Uuid>,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default = "default_end_time")]
    pub end_time: f64,
    #[serde(default)]
    pub source_start_time: f64,
    #[serde(default = "default_end_time")]
    pub source_end_time: f64,
}

const fn default_end_time() -> f64 {
    10.0
}

impl Clip {
    pub fn new(name: &str, start_time: f64, end_time: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            reference_id: None,
            start_time,
            end_time,
            source_start_time: 0.0,
            source_end_time: end_time - start_time,
        }
    }

    pub fn with_source_range(mut self, source_start_time: f64, source_end_time: f64) -> Self {
        self.source_start_time = source_start_time;
        self.source_end_time = source_end_time;
        self
    }

    pub fn duration(&self) -> f64 {
        (self.end_time - self.start_time).max(0.0)
    }

    pub fn source_duration(&self) -> f64 {
        (self.source_end_time - self.source_start_time).max(0.0)
    }

    /// Start inclusive, end exclusive.
    pub fn is_active_at(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }

    /// Maps a timeline time into the clip's source range.
    pub fn source_time_at(&self, time: f64) -> Option<f64> {
        if !self.is_active_at(time) {
            return None;
        }
        let local = time - self.start_time;
        let source_duration = self.source_duration();
        if source_duration <= f64::EPSILON {
            return Some(self.source_start_time);
        }
        Some(self.source_start_time + local.rem_euclid(source_duration))
    }
}
