// SPDX-License-Identifier: GPL-3.0-or-later

pub mod color;
pub mod event;
pub mod jalali;
pub mod settings;
pub mod store;
pub mod util;
