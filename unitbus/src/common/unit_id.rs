/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::message::MessageError;

/// Identifies a logical component instance as `type/unit[/instance]`.
///
/// Two ids compare equal when type and unit match and either side omits the
/// instance, so `"frontend/web"` addresses every `"frontend/web/<n>"`. Hashing only
/// covers type and unit to stay consistent with that equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UnitId {
    unit_type: String,
    unit: String,
    instance: Option<String>,
}

impl UnitId {
    /// Creates an id without an instance component.
    pub fn new(unit_type: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            unit_type: unit_type.into(),
            unit: unit.into(),
            instance: None,
        }
    }

    /// Creates an id bound to a specific instance.
    pub fn with_instance(
        unit_type: impl Into<String>,
        unit: impl Into<String>,
        instance: impl Into<String>,
    ) -> Self {
        Self {
            unit_type: unit_type.into(),
            unit: unit.into(),
            instance: Some(instance.into()),
        }
    }

    /// The component type.
    #[must_use]
    pub fn unit_type(&self) -> &str {
        &self.unit_type
    }

    /// The unit name within the type.
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The instance, if this id names one.
    #[must_use]
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }
}

impl PartialEq for UnitId {
    fn eq(&self, other: &Self) -> bool {
        if self.unit_type != other.unit_type || self.unit != other.unit {
            return false;
        }
        match (&self.instance, &other.instance) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }
}

impl Hash for UnitId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unit_type.hash(state);
        self.unit.hash(state);
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instance {
            Some(instance) => write!(f, "{}/{}/{}", self.unit_type, self.unit, instance),
            None => write!(f, "{}/{}", self.unit_type, self.unit),
        }
    }
}

impl FromStr for UnitId {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.iter().any(|part| part.trim().is_empty()) {
            return Err(MessageError::InvalidUnitId(s.to_string()));
        }
        match parts.as_slice() {
            [unit_type, unit] => Ok(Self::new(*unit_type, *unit)),
            [unit_type, unit, instance] => Ok(Self::with_instance(*unit_type, *unit, *instance)),
            _ => Err(MessageError::InvalidUnitId(s.to_string())),
        }
    }
}

impl TryFrom<String> for UnitId {
    type Error = MessageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UnitId> for String {
    fn from(id: UnitId) -> Self {
        id.to_string()
    }
}
