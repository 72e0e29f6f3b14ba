// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// Log from an admin handler. The calling module names its unit through a
/// `UNIT` constant.
macro_rules! adm_log {
    ($log:expr, $level:ident, $msg:expr, $($args:expr),*; $($key:expr => $value:expr),*) => {
        slog::$level!($log,
            $msg, $($args),*;
            "component" => crate::COMPONENT_RINJD,
            "module" => crate::MOD_ADMIN,
            "unit" => UNIT,
            $($key => $value),*
        )
    };
    ($log:expr, $level:ident, $msg:expr; $($key:expr => $value:expr),*) => {
        slog::$level!($log,
            $msg;
            "component" => crate::COMPONENT_RINJD,
            "module" => crate::MOD_ADMIN,
            "unit" => UNIT,
            $($key => $value),*
        )
    };
    ($log:expr, $level:ident, $msg:expr) => {
        slog::$level!($log,
            $msg;
            "component" => crate::COMPONENT_RINJD,
            "module" => crate::MOD_ADMIN,
            "unit" => UNIT
        )
    };
    ($log:expr, $level:ident, $msg:expr, $($args:expr),*) => {
        slog::$level!($log,
            $msg, $($args),*;
            "component" => crate::COMPONENT_RINJD,
            "module" => crate::MOD_ADMIN,
            "unit" => UNIT,
        )
    };
}

pub(crate) use adm_log;
