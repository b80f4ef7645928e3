use crate::human_mouse;
use enigo::{MouseButton, MouseControllable};
use std::time::Duration;

/// Press-and-release at absolute screen coordinates. Returns once the button
/// is released.
pub trait Clicker {
    fn click(&mut self, x: i32, y: i32, hold: Duration);
}

/// Left clicks through `enigo`. Create it on the thread that will use it.
pub struct EnigoClicker {
    enigo: enigo::Enigo,
    glide: bool,
}

impl EnigoClicker {
    pub fn new(glide: bool) -> Self {
        Self { enigo: enigo::Enigo::new(), glide }
    }
}

impl Clicker for EnigoClicker {
    fn click(&mut self, x: i32, y: i32, hold: Duration) {
        if self.glide {
            let mut rng = rand::thread_rng();
            let path = human_mouse::glide_path(&mut rng, self.enigo.mouse_location(), (x, y));
            human_mouse::move_along(&mut self.enigo, &mut rng, &path);
        } else {
            self.enigo.mouse_move_to(x, y);
        }
        self.enigo.mouse_down(MouseButton::Left);
        std::thread::sleep(hold);
        self.enigo.mouse_up(MouseButton::Left);
    }
}
