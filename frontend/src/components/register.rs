use common::{
    feed::LooseNumber,
    req::RegisterRequest,
    validate::{self, ValidationError},
};
use log::info;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::{request, utils, Route};

#[derive(Clone, Default, PartialEq)]
struct Form {
    user_name: String,
    school_email: String,
    phone_number: String,
    address: String,
    lat: String,
    lon: String,
    password: String,
    confirm_password: String,
}

fn optional(value: &str) -> Option<String> {
    validate::required(Some(value)).map(str::to_owned)
}

impl Form {
    fn request(&self) -> RegisterRequest {
        RegisterRequest {
            user_name: optional(&self.user_name),
            school_email: optional(&self.school_email),
            phone_number: optional(&self.phone_number),
            address: optional(&self.address),
            lat: optional(&self.lat).map(|v| LooseNumber::from(v.as_str())),
            lon: optional(&self.lon).map(|v| LooseNumber::from(v.as_str())),
            password: Some(self.password.clone()),
        }
    }
}

#[function_component(Register)]
pub fn register() -> Html {
    let navigator = use_navigator();
    let form = use_state(Form::default);
    let errors = use_state(Vec::<String>::new);
    let pending = use_state(|| false);

    // one input callback per form field
    let field = |update: fn(&mut Form, String)| {
        let form = form.clone();
        Callback::from(move |e: InputEvent| {
            let mut next = (*form).clone();
            update(&mut next, utils::input_value(&e));
            form.set(next);
        })
    };

    let onsubmit = {
        let form = form.clone();
        let errors = errors.clone();
        let pending = pending.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if *pending {
                return;
            }

            let req = form.request();
            if let Err(problems) = validate::validate_registration(&req, &form.confirm_password) {
                errors.set(problems.iter().map(ValidationError::to_string).collect());
                return;
            }

            let navigator = navigator.clone();
            let errors = errors.clone();
            let pending = pending.clone();
            pending.set(true);

            wasm_bindgen_futures::spawn_local(async move {
                match request::register(&req).await {
                    Ok(resp) => {
                        info!("{}", resp.message);
                        if let Some(navigator) = navigator {
                            navigator.push(&Route::Login);
                        }
                    }
                    Err(e) => errors.set(vec![e.to_string()]),
                }
                pending.set(false);
            });
        })
    };

    html! {
        <form class="panel panel-default panel-body" {onsubmit}>
            if !errors.is_empty() {
                <div class="alert alert-danger">
                    { for errors.iter().map(|e| html! { <div>{e.clone()}</div> }) }
                </div>
            }
            <div class="form-group">
                <input type="text" class="form-control" placeholder="Full Name"
                    value={form.user_name.clone()}
                    oninput={field(|f, v| f.user_name = v)} />
            </div>
            <div class="form-group">
                <input type="email" class="form-control" placeholder="School Email"
                    value={form.school_email.clone()}
                    oninput={field(|f, v| f.school_email = v)} required={true} />
            </div>
            <div class="form-group">
                <input type="tel" class="form-control" placeholder="Phone Number"
                    value={form.phone_number.clone()}
                    oninput={field(|f, v| f.phone_number = v)} required={true} />
            </div>
            <div class="form-group">
                <input type="text" class="form-control" placeholder="Address"
                    value={form.address.clone()}
                    oninput={field(|f, v| f.address = v)} />
            </div>
            <div class="row">
                <div class="form-group col-xs-6">
                    <input type="text" class="form-control" placeholder="Latitude"
                        value={form.lat.clone()}
                        oninput={field(|f, v| f.lat = v)} />
                </div>
                <div class="form-group col-xs-6">
                    <input type="text" class="form-control" placeholder="Longitude"
                        value={form.lon.clone()}
                        oninput={field(|f, v| f.lon = v)} />
                </div>
            </div>
            <div class="form-group">
                <input type="password" class="form-control" placeholder="Password"
                    value={form.password.clone()}
                    oninput={field(|f, v| f.password = v)} required={true} />
            </div>
            <div class="form-group">
                <input type="password" class="form-control" placeholder="Confirm Password"
                    value={form.confirm_password.clone()}
                    oninput={field(|f, v| f.confirm_password = v)} required={true} />
            </div>
            <button type="submit" class="btn btn-primary btn-block" disabled={*pending}>
                {"Register"}
            </button>
            <p class="text-center">
                {"Already registered? "}
                <Link<Route> to={Route::Login}>{"Login"}</Link<Route>>
            </p>
        </form>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_are_not_sent() {
        let form = Form {
            school_email: " a@b.com ".into(),
            lat: "12.5".into(),
            password: "abc1234".into(),
            ..Default::default()
        };
        let req = form.request();

        assert_eq!(req.school_email.as_deref(), Some("a@b.com"));
        assert_eq!(req.user_name, None);
        assert_eq!(req.lat.as_ref().and_then(LooseNumber::as_number), Some(12.5));
        assert_eq!(req.lon, None);
    }
}
