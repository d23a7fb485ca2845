use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Vec2 {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Vec3 {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
    pub z: OrderedFloat<f64>,
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Vec4 {
    pub x: OrderedFloat<f64>,
    pub y: OrderedFloat<f64>,
    pub z: OrderedFloat<f64>,
    pub w: OrderedFloat<f64>,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
        }
    }
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
            z: OrderedFloat(z),
        }
    }
}

impl Vec4 {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self {
            x: OrderedFloat(x),
            y: OrderedFloat(y),
            z: OrderedFloat(z),
            w: OrderedFloat(w),
        }
    }
}

/// The value held by a slot.
///
/// Floats are wrapped in `OrderedFloat` so that change detection is total:
/// a slot that keeps producing NaN is not reported as changed on every pull.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Hash, Debug)]
pub enum SlotValue {
    Float(OrderedFloat<f64>),
    Integer(i64),
    Boolean(bool),
    String(String),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl Default for SlotValue {
    fn default() -> Self {
        SlotValue::Float(OrderedFloat(0.0))
    }
}

impl SlotValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SlotValue::Float(_) => "float",
            SlotValue::Integer(_) => "integer",
            SlotValue::Boolean(_) => "boolean",
            SlotValue::String(_) => "string",
            SlotValue::Vec2(_) => "vec2",
            SlotValue::Vec3(_) => "vec3",
            SlotValue::Vec4(_) => "vec4",
        }
    }

    pub fn same_type(&self, other: &SlotValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Number of curves needed to animate a value of this type, or `None`
    /// when the type has no sampling strategy.
    pub fn component_count(&self) -> Option<usize> {
        match self {
            SlotValue::Float(_) => Some(1),
            SlotValue::Vec2(_) => Some(2),
            SlotValue::Vec3(_) => Some(3),
            SlotValue::Vec4(_) => Some(4),
            SlotValue::Integer(_) | SlotValue::Boolean(_) | SlotValue::String(_) => None,
        }
    }

    /// Component in X, Y, Z, W order.
    pub fn component(&self, index: usize) -> Option<f64> {
        let value = match (self, index) {
            (SlotValue::Float(v), 0) => v,
            (SlotValue::Vec2(v), 0) => &v.x,
            (SlotValue::Vec2(v), 1) => &v.y,
            (SlotValue::Vec3(v), 0) => &v.x,
            (SlotValue::Vec3(v), 1) => &v.y,
            (SlotValue::Vec3(v), 2) => &v.z,
            (SlotValue::Vec4(v), 0) => &v.x,
            (SlotValue::Vec4(v), 1) => &v.y,
            (SlotValue::Vec4(v), 2) => &v.z,
            (SlotValue::Vec4(v), 3) => &v.w,
            _ => return None,
        };
        Some(value.0)
    }

    /// Writes one component. Returns false when the type has no such component.
    pub fn set_component(&mut self, index: usize, component: f64) -> bool {
        let target = match (self, index) {
            (SlotValue::Float(v), 0) => v,
            (SlotValue::Vec2(v), 0) => &mut v.x,
            (SlotValue::Vec2(v), 1) => &mut v.y,
            (SlotValue::Vec3(v), 0) => &mut v.x,
            (SlotValue::Vec3(v), 1) => &mut v.y,
            (SlotValue::Vec3(v), 2) => &mut v.z,
            (SlotValue::Vec4(v), 0) => &mut v.x,
            (SlotValue::Vec4(v), 1) => &mut v.y,
            (SlotValue::Vec4(v), 2) => &mut v.z,
            (SlotValue::Vec4(v), 3) => &mut v.w,
            _ => return false,
        };
        *target = OrderedFloat(component);
        true
    }

    pub fn components(&self) -> Vec<f64> {
        let count = self.component_count().unwrap_or(0);
        (0..count).filter_map(|index| self.component(index)).collect()
    }
}

impl From<f64> for SlotValue {
    fn from(value: f64) -> Self {
        SlotValue::Float(OrderedFloat(value))
    }
}

impl From<f32> for SlotValue {
    fn from(value: f32) -> Self {
        SlotValue::Float(OrderedFloat(value as f64))
    }
}

impl From<i64> for SlotValue {
    fn from(value: i64) -> Self {
        SlotValue::Integer(value)
    }
}

impl From<bool> for SlotValue {
    fn from(value: bool) -> Self {
        SlotValue::Boolean(value)
    }
}

impl From<String> for SlotValue {
    fn from(value: String) -> Self {
        SlotValue::String(value)
    }
}

impl From<&str> for SlotValue {
    fn from(value: &str) -> Self {
        SlotValue::String(value.to_string())
    }
}

impl From<Vec2> for SlotValue {
    fn from(value: Vec2) -> Self {
        SlotValue::Vec2(value)
    }
}

impl From<Vec3> for SlotValue {
    fn from(value: Vec3) -> Self {
        SlotValue::Vec3(value)
    }
}

impl From<Vec4> for SlotValue {
    fn from(value: Vec4) -> Self {
        SlotValue::Vec4(value)
    }
}

// Type-safe extraction from SlotValue
pub trait TryGetValue<T> {
    fn try_get(v: &SlotValue) -> Option<T>;
}

impl TryGetValue<f64> for f64 {
    fn try_get(v: &SlotValue) -> Option<f64> {
        match v {
            SlotValue::Float(f) => Some(f.into_inner()),
            SlotValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl TryGetValue<i64> for i64 {
    fn try_get(v: &SlotValue) -> Option<i64> {
        match v {
            SlotValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl TryGetValue<bool> for bool {
    fn try_get(v: &SlotValue) -> Option<bool> {
        match v {
            SlotValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl TryGetValue<String> for String {
    fn try_get(v: &SlotValue) -> Option<String> {
        match v {
            SlotValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl TryGetValue<Vec2> for Vec2 {
    fn try_get(v: &SlotValue) -> Option<Vec2> {
        match v {
            SlotValue::Vec2(vec) => Some(*vec),
            _ => None,
        }
    }
}

impl TryGetValue<Vec3> for Vec3 {
    fn try_get(v: &SlotValue) -> Option<Vec3> {
        match v {
            SlotValue::Vec3(vec) => Some(*vec),
            _ => None,
        }
    }
}

impl TryGetValue<Vec4> for Vec4 {
    fn try_get(v: &SlotValue) -> Option<Vec4> {
        match v {
            SlotValue::Vec4(vec) => Some(*vec),
            _ => None,
        }
    }
}

impl SlotValue {
    pub fn get_as<T: TryGetValue<T>>(&self) -> Option<T> {
        T::try_get(self)
    }
}
