// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod stages;
pub mod factory;

pub use stages::*;
pub use factory::LocalStageFactory;
