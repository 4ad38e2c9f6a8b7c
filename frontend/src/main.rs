mod components;
mod request;
mod session;
mod utils;

use yew::prelude::*;
use yew_router::prelude::*;

#[derive(Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/login")]
    Login,
    #[at("/register")]
    Register,
    #[at("/dashboard")]
    Dashboard,
    #[not_found]
    #[at("/404")]
    NotFound,
}

#[function_component(App)]
fn app() -> Html {
    html! {
        <BrowserRouter>
            <Switch<Route> render={switch} />
        </BrowserRouter>
    }
}

#[function_component(PageLogin)]
pub fn page_login() -> Html {
    html! {
        <div class="container">
            <div class="row">
                <div class="col-md-4 col-md-offset-4">
                    <h1 class="page-header text-center">{"Weather Station"}</h1>
                    <components::login::Login />
                </div>
            </div>
        </div>
    }
}

#[function_component(PageRegister)]
pub fn page_register() -> Html {
    html! {
        <div class="container">
            <div class="row">
                <div class="col-md-6 col-md-offset-3">
                    <h1 class="page-header text-center">{"Create an account"}</h1>
                    <components::register::Register />
                </div>
            </div>
        </div>
    }
}

#[function_component(PageDashboard)]
pub fn page_dashboard() -> Html {
    html! {
        <div class="container-fluid">
            <components::dashboard::Dashboard />
            <footer class="text-muted text-center">
                {format!("v{}", env!("CARGO_PKG_VERSION"))}
            </footer>
        </div>
    }
}

fn switch(routes: Route) -> Html {
    match routes {
        Route::Home => {
            if session::current().is_authenticated() {
                html! { <Redirect<Route> to={Route::Dashboard}/> }
            } else {
                html! { <Redirect<Route> to={Route::Login}/> }
            }
        }
        Route::Login => html! { <PageLogin/> },
        Route::Register => html! { <PageRegister/> },
        Route::Dashboard => html! { <PageDashboard/> },
        Route::NotFound => html! { <Redirect<Route> to={Route::Home}/> },
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
