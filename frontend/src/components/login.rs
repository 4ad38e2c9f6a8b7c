use common::{req::LoginRequest, session::SessionMarker};
use log::info;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{request, session, utils, Route};

const LOGIN_FAILED: &str = "Login failed. Check your email and password.";

#[function_component(Login)]
pub fn login() -> Html {
    let navigator = use_navigator();
    let user_id = use_state(String::new);
    let password = use_state(String::new);
    let error = use_state(|| None::<String>);
    let pending = use_state(|| false);

    // a live session skips the form
    {
        let navigator = navigator.clone();
        use_effect_with((), move |_| {
            if session::current().is_authenticated() {
                if let Some(navigator) = navigator {
                    navigator.replace(&Route::Dashboard);
                }
            }
        });
    }

    let onsubmit = {
        let user_id = user_id.clone();
        let password = password.clone();
        let error = error.clone();
        let pending = pending.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if *pending {
                return;
            }

            let form = LoginRequest {
                user_id: Some((*user_id).clone()),
                password: Some((*password).clone()),
            };
            let navigator = navigator.clone();
            let error = error.clone();
            let pending = pending.clone();
            pending.set(true);

            wasm_bindgen_futures::spawn_local(async move {
                match request::login(&form).await {
                    Ok(resp) => {
                        info!("logged in as {}", resp.user.school_email);
                        session::store(&SessionMarker::new(resp.token, resp.expires_at));
                        if let Some(navigator) = navigator {
                            navigator.push(&Route::Dashboard);
                        }
                    }
                    Err(e) if e.is_auth_failure() => error.set(Some(LOGIN_FAILED.to_owned())),
                    Err(e) => error.set(Some(e.to_string())),
                }
                pending.set(false);
            });
        })
    };

    let on_user_id = {
        let user_id = user_id.clone();
        Callback::from(move |e: InputEvent| user_id.set(utils::input_value(&e)))
    };
    let on_password = {
        let password = password.clone();
        Callback::from(move |e: InputEvent| password.set(utils::input_value(&e)))
    };

    html! {
        <form class="panel panel-default panel-body" {onsubmit}>
            <h2 class="text-center">{"Login"}</h2>
            if let Some(message) = (*error).clone() {
                <div class="alert alert-danger">{message}</div>
            }
            <div class="form-group">
                <input type="text" class="form-control" placeholder="Email Address"
                    value={(*user_id).clone()} oninput={on_user_id} required={true} />
            </div>
            <div class="form-group">
                <input type="password" class="form-control" placeholder="Password"
                    value={(*password).clone()} oninput={on_password} required={true} />
            </div>
            <button type="submit" class="btn btn-primary btn-block" disabled={*pending}>
                {"Sign In"}
            </button>
            <p class="text-center">
                {"Don't have an account? "}
                <Link<Route> to={Route::Register}>{"Register Here"}</Link<Route>>
            </p>
        </form>
    }
}
