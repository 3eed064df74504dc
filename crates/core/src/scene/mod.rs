use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

use serde::{Deserialize, Serialize};

/// Identifies one animatable property of one layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyKey {
    pub layer: String,
    pub property: String,
}

impl PropertyKey {
    pub fn new(layer: impl Into<String>, property: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            property: property.into(),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.layer, self.property)
    }
}

/// A property change captured while a recording was open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyWrite {
    pub key: PropertyKey,
    /// Presentation value when the write happened.
    pub from: f64,
    /// New model value.
    pub to: f64,
}

impl PropertyWrite {
    pub fn value_at(&self, progress: f64) -> f64 {
        self.from + (self.to - self.from) * progress
    }
}

#[derive(Debug, Clone, Copy)]
struct PropertyValue {
    /// Value last written by a mutation.
    model: f64,
    /// Value currently on screen.
    presentation: f64,
}

#[derive(Debug, Default)]
struct SceneState {
    values: BTreeMap<PropertyKey, PropertyValue>,
    recordings: Vec<Vec<PropertyWrite>>,
    interaction_blocks: usize,
}

/// Shared view model the bundled renderers animate.
///
/// Each property keeps a model value (what mutations wrote) and a presentation
/// value (what is currently shown). Outside a recording both move together.
/// Inside [`Scene::record`] only the model moves and the write is captured, so
/// a renderer can interpolate the presentation afterwards.
#[derive(Clone, Default)]
pub struct Scene {
    state: Rc<RefCell<SceneState>>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience handle for the properties of a single layer.
    pub fn layer(&self, name: impl Into<String>) -> Layer {
        Layer {
            scene: self.clone(),
            name: name.into(),
        }
    }

    pub fn set(&self, key: PropertyKey, value: f64) {
        let mut state = self.state.borrow_mut();
        let state = &mut *state;
        let recording = state.recordings.last_mut();

        match state.values.get_mut(&key) {
            Some(current) => {
                current.model = value;
                match recording {
                    Some(writes) => {
                        if let Some(write) = writes.iter_mut().find(|w| w.key == key) {
                            write.to = value;
                        } else {
                            writes.push(PropertyWrite {
                                key,
                                from: current.presentation,
                                to: value,
                            });
                        }
                    }
                    None => current.presentation = value,
                }
            }
            // Properties appear at their first value; there is nothing to animate from.
            None => {
                state.values.insert(
                    key,
                    PropertyValue {
                        model: value,
                        presentation: value,
                    },
                );
            }
        }
    }

    /// Model value, the target of any running animation.
    pub fn get(&self, key: &PropertyKey) -> Option<f64> {
        self.state.borrow().values.get(key).map(|v| v.model)
    }

    /// Value currently on screen.
    pub fn presentation(&self, key: &PropertyKey) -> Option<f64> {
        self.state.borrow().values.get(key).map(|v| v.presentation)
    }

    /// Moves the on-screen value without touching the model.
    pub fn present(&self, key: &PropertyKey, value: f64) {
        if let Some(current) = self.state.borrow_mut().values.get_mut(key) {
            current.presentation = value;
        }
    }

    /// Makes the on-screen value the new model value.
    pub fn commit_presentation(&self, key: &PropertyKey) {
        if let Some(current) = self.state.borrow_mut().values.get_mut(key) {
            current.model = current.presentation;
        }
    }

    /// Runs `mutation` and returns the property writes it made.
    ///
    /// Recordings nest; a write lands in the innermost open recording.
    pub fn record<F: FnOnce()>(&self, mutation: F) -> Vec<PropertyWrite> {
        self.state.borrow_mut().recordings.push(Vec::new());
        mutation();
        self.state
            .borrow_mut()
            .recordings
            .pop()
            .unwrap_or_default()
    }

    pub fn is_recording(&self) -> bool {
        !self.state.borrow().recordings.is_empty()
    }

    pub fn block_interaction(&self) {
        self.state.borrow_mut().interaction_blocks += 1;
    }

    pub fn unblock_interaction(&self) {
        let mut state = self.state.borrow_mut();
        state.interaction_blocks = state.interaction_blocks.saturating_sub(1);
    }

    /// False while any animation that disallows interaction is in flight.
    pub fn accepts_interaction(&self) -> bool {
        self.state.borrow().interaction_blocks == 0
    }

    /// Presentation values of every property, ordered by key.
    pub fn snapshot(&self) -> Vec<(PropertyKey, f64)> {
        self.state
            .borrow()
            .values
            .iter()
            .map(|(key, value)| (key.clone(), value.presentation))
            .collect()
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Scene")
            .field("properties", &state.values.len())
            .field("recording", &!state.recordings.is_empty())
            .field("interaction_blocks", &state.interaction_blocks)
            .finish()
    }
}

/// Named layer within a [`Scene`].
#[derive(Debug, Clone)]
pub struct Layer {
    scene: Scene,
    name: String,
}

impl Layer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self, property: &str) -> PropertyKey {
        PropertyKey::new(self.name.clone(), property)
    }

    pub fn set(&self, property: &str, value: f64) {
        self.scene.set(self.key(property), value);
    }

    pub fn get(&self, property: &str) -> Option<f64> {
        self.scene.get(&self.key(property))
    }

    pub fn presentation(&self, property: &str) -> Option<f64> {
        self.scene.presentation(&self.key(property))
    }
}
