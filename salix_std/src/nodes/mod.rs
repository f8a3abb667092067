// Tasks
mod wait_task;
pub use wait_task::WaitTask;

mod play_sound_task;
pub use play_sound_task::PlaySoundTask;

mod fire_event_task;
pub use fire_event_task::FireEventTask;

mod move_to_task;
pub use move_to_task::MoveToTask;

mod attack_task;
pub use attack_task::AttackTask;

mod random_point_task;
pub use random_point_task::RandomPointTask;

mod keep_distance_task;
pub use keep_distance_task::KeepDistanceTask;

mod set_value_task;
pub use set_value_task::SetValueTask;

mod make_noise_task;
pub use make_noise_task::MakeNoiseTask;

// Decorators
mod cooldown_decorator;
pub use cooldown_decorator::CooldownDecorator;

mod watch_value_decorator;
pub use watch_value_decorator::WatchValueDecorator;

mod can_see_decorator;
pub use can_see_decorator::CanSeeDecorator;

mod in_range_decorator;
pub use in_range_decorator::IsInRangeDecorator;

mod util;
pub(crate) use util::resolve_position;
