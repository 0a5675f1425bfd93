mod export;
mod goal;
mod helpers;
mod log;
mod summary;
mod sync_cmd;
mod track;
mod weight;
mod workout;

pub(crate) use export::{cmd_export, cmd_import};
pub(crate) use goal::{cmd_goal_set, cmd_goal_show, cmd_goal_toggle};
pub(crate) use log::{cmd_barcode, cmd_dedupe, cmd_log, cmd_photo, cmd_remove, cmd_search};
pub(crate) use summary::{cmd_frequent, cmd_summary, cmd_week};
pub(crate) use sync_cmd::{cmd_sync_pull, cmd_sync_push};
pub(crate) use track::{cmd_track_add, cmd_track_define, cmd_track_rm, cmd_track_show};
pub(crate) use weight::{cmd_weight_history, cmd_weight_log};
pub(crate) use workout::{cmd_max, cmd_workout_best, cmd_workout_log, cmd_workout_show};
