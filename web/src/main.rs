use dioxus::prelude::*;

use ui::views::Report;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[route("/")]
    Report {},
}

const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    ui::i18n::init();

    rsx! {
        // Global app resources. plotly.js stays external: the report loads
        // descriptors and hands them to whatever the page provides.
        document::Link { rel: "stylesheet", href: MAIN_CSS }
        document::Script { src: "https://cdn.plot.ly/plotly-2.35.2.min.js" }

        Router::<Route> {}
    }
}
