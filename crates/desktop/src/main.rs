mod app;
mod dialog_authorizer;
mod overlay_canvas;
mod settings;

use app::App;

fn main() -> iced::Result {
    env_logger::init();

    iced::application(App::new, App::update, App::view)
        .title("FaceCam")
        .theme(App::theme)
        .subscription(App::subscription)
        .window(iced::window::Settings {
            size: app::WINDOW_SIZE,
            ..Default::default()
        })
        .run()
}
