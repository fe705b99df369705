// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::model::AttributeValue;
use bytes::Bytes;
use std::collections::BTreeSet;

/// Converts record fields to and from attribute values.
///
/// Each implementation maps to a single category. A field whose value cannot
/// be stored, such as an empty string or `None`, converts to the empty value
/// of its category.
pub trait AttributeField {
    /// The empty value for this field's category.
    fn empty() -> AttributeValue
    where
        Self: Sized;

    fn to_attribute(&self) -> AttributeValue;

    /// Sets the field from a stored value, returning the reason on failure.
    fn from_attribute(&mut self, value: &AttributeValue) -> Result<(), String>;
}

fn mismatch(want: &str, got: &AttributeValue) -> String {
    format!(
        "expected a value of type {want}, got a value of type {}",
        got.category()
    )
}

impl AttributeField for String {
    fn empty() -> AttributeValue {
        AttributeValue::S(String::new())
    }

    fn to_attribute(&self) -> AttributeValue {
        AttributeValue::S(self.clone())
    }

    fn from_attribute(&mut self, value: &AttributeValue) -> Result<(), String> {
        match value {
            AttributeValue::S(v) => {
                self.clone_from(v);
                Ok(())
            }
            v => Err(mismatch("S", v)),
        }
    }
}

macro_rules! impl_number {
    ($($t:ty),*) => {$(
        impl AttributeField for $t {
            fn empty() -> AttributeValue {
                AttributeValue::N(String::new())
            }

            fn to_attribute(&self) -> AttributeValue {
                AttributeValue::N(self.to_string())
            }

            fn from_attribute(&mut self, value: &AttributeValue) -> Result<(), String> {
                match value {
                    AttributeValue::N(v) => {
                        *self = v
                            .parse::<$t>()
                            .map_err(|e| format!("cannot parse {v:?}: {e}"))?;
                        Ok(())
                    }
                    v => Err(mismatch("N", v)),
                }
            }
        }
    )*};
}

impl_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Booleans are stored as the numbers 0 and 1.
impl AttributeField for bool {
    fn empty() -> AttributeValue {
        AttributeValue::N(String::new())
    }

    fn to_attribute(&self) -> AttributeValue {
        AttributeValue::N(if *self { "1" } else { "0" }.to_string())
    }

    fn from_attribute(&mut self, value: &AttributeValue) -> Result<(), String> {
        match value {
            AttributeValue::N(v) => {
                let n = v
                    .parse::<f64>()
                    .map_err(|e| format!("cannot parse {v:?}: {e}"))?;
                *self = n != 0.0;
                Ok(())
            }
            v => Err(mismatch("N", v)),
        }
    }
}

impl AttributeField for Bytes {
    fn empty() -> AttributeValue {
        AttributeValue::B(Bytes::new())
    }

    fn to_attribute(&self) -> AttributeValue {
        AttributeValue::B(self.clone())
    }

    fn from_attribute(&mut self, value: &AttributeValue) -> Result<(), String> {
        match value {
            AttributeValue::B(v) => {
                *self = v.clone();
                Ok(())
            }
            v => Err(mismatch("B", v)),
        }
    }
}

impl AttributeField for Vec<u8> {
    fn empty() -> AttributeValue {
        AttributeValue::B(Bytes::new())
    }

    fn to_attribute(&self) -> AttributeValue {
        AttributeValue::B(Bytes::copy_from_slice(self))
    }

    fn from_attribute(&mut self, value: &AttributeValue) -> Result<(), String> {
        match value {
            AttributeValue::B(v) => {
                *self = v.to_vec();
                Ok(())
            }
            v => Err(mismatch("B", v)),
        }
    }
}

impl AttributeField for Vec<Bytes> {
    fn empty() -> AttributeValue {
        AttributeValue::Bs(Vec::new())
    }

    fn to_attribute(&self) -> AttributeValue {
        AttributeValue::Bs(self.clone())
    }

    fn from_attribute(&mut self, value: &AttributeValue) -> Result<(), String> {
        match value {
            AttributeValue::Bs(v) => {
                self.clone_from(v);
                Ok(())
            }
            v => Err(mismatch("BS", v)),
        }
    }
}

impl AttributeField for Vec<String> {
    fn empty() -> AttributeValue {
        AttributeValue::Ss(Vec::new())
    }

    fn to_attribute(&self) -> AttributeValue {
        AttributeValue::Ss(self.clone())
    }

    fn from_attribute(&mut self, value: &AttributeValue) -> Result<(), String> {
        match value {
            AttributeValue::Ss(v) => {
                self.clone_from(v);
                Ok(())
            }
            v => Err(mismatch("SS", v)),
        }
    }
}

impl AttributeField for BTreeSet<String> {
    fn empty() -> AttributeValue {
        AttributeValue::Ss(Vec::new())
    }

    fn to_attribute(&self) -> AttributeValue {
        AttributeValue::Ss(self.iter().cloned().collect())
    }

    fn from_attribute(&mut self, value: &AttributeValue) -> Result<(), String> {
        match value {
            AttributeValue::Ss(v) => {
                *self = v.iter().cloned().collect();
                Ok(())
            }
            v => Err(mismatch("SS", v)),
        }
    }
}

impl AttributeField for Vec<i64> {
    fn empty() -> AttributeValue {
        AttributeValue::Ns(Vec::new())
    }

    fn to_attribute(&self) -> AttributeValue {
        AttributeValue::Ns(self.iter().map(i64::to_string).collect())
    }

    fn from_attribute(&mut self, value: &AttributeValue) -> Result<(), String> {
        match value {
            AttributeValue::Ns(v) => {
                *self = v
                    .iter()
                    .map(|n| n.parse::<i64>().map_err(|e| format!("cannot parse {n:?}: {e}")))
                    .collect::<Result<_, _>>()?;
                Ok(())
            }
            v => Err(mismatch("NS", v)),
        }
    }
}

impl<T> AttributeField for Option<T>
where
    T: AttributeField + Default,
{
    fn empty() -> AttributeValue {
        T::empty()
    }

    fn to_attribute(&self) -> AttributeValue {
        match self {
            Some(v) => v.to_attribute(),
            None => T::empty(),
        }
    }

    fn from_attribute(&mut self, value: &AttributeValue) -> Result<(), String> {
        let mut v = T::default();
        v.from_attribute(value)?;
        *self = Some(v);
        Ok(())
    }
}
