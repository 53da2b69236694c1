// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::RwLock;

use crate::error::{self, Result};

use super::{IsPersistent, Storage};

pub(crate) struct Memory<T> {
    data: RwLock<Option<T>>,
}

impl<T> Memory<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

impl<T> IsPersistent for Memory<T> {
    fn is_persistent(&self) -> bool {
        false
    }
}

impl<T: Send + Sync + Clone> Storage<T> for Memory<T> {
    fn get(&self) -> Result<Option<T>> {
        let guard = self.data.read().map_err(|_| error::Storage::Poisoned)?;
        Ok(guard.clone())
    }

    fn update(&self, data: &T) -> Result<()> {
        let mut guard = self.data.write().map_err(|_| error::Storage::Poisoned)?;
        *guard = Some(data.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self.data.write().map_err(|_| error::Storage::Poisoned)?;
        *guard = None;
        Ok(())
    }
}

impl<T> Default for Memory<T> {
    fn default() -> Self {
        Self {
            data: RwLock::new(None),
        }
    }
}
