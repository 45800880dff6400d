//! Sign-in / registration view.

use dioxus::prelude::*;
use motorbay_shared::{LoginRequest, RegisterRequest};

use super::Services;
use crate::api_client::ApiClient;
use crate::config;

#[component]
pub fn Login() -> Element {
    let services = use_context::<Services>();

    let mut registering = use_signal(|| false);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut first_name = use_signal(String::new);
    let mut last_name = use_signal(String::new);
    let mut error = use_signal(|| None::<String>);
    let mut is_loading = use_signal(|| false);

    let handle_submit = {
        let services = services.clone();
        move |e: FormEvent| {
            e.prevent_default();
            let email_value = email.read().trim().to_string();
            let password_value = password.read().clone();
            if email_value.is_empty() || password_value.is_empty() {
                error.set(Some("Email and password are required".to_string()));
                return;
            }

            is_loading.set(true);
            let services = services.clone();
            let register = *registering.read();
            let first = first_name.read().trim().to_string();
            let last = last_name.read().trim().to_string();

            spawn(async move {
                let client = ApiClient::new(config::api_base_url());
                let result = if register {
                    client
                        .register(&RegisterRequest {
                            email: email_value,
                            password: password_value,
                            first_name: first,
                            last_name: last,
                            phone_number: None,
                        })
                        .await
                } else {
                    client
                        .login(&LoginRequest {
                            email: email_value,
                            password: password_value,
                        })
                        .await
                };

                match result {
                    Ok(auth) => {
                        // store() broadcasts the auth change; the app
                        // shell and hubs pick it up from there.
                        services.session.store(&auth.into());
                    }
                    Err(err) => {
                        error.set(Some(err.user_message()));
                        is_loading.set(false);
                    }
                }
            });
        }
    };

    rsx! {
        div { class: "min-h-screen bg-[#1e1f22] flex items-center justify-center",
            div { class: "bg-[#313338] rounded-lg shadow-2xl w-full max-w-md p-8",
                h1 { class: "text-2xl font-bold text-white mb-1", "motorbay" }
                p { class: "text-sm text-gray-400 mb-6",
                    if *registering.read() {
                        "Create your account"
                    } else {
                        "Sign in to continue"
                    }
                }
                form { onsubmit: handle_submit, class: "space-y-4",
                    if *registering.read() {
                        div { class: "flex gap-3",
                            input {
                                class: "flex-1 bg-[#1e1f22] border-none rounded p-2.5 text-white placeholder-[#949ba4] focus:ring-0",
                                placeholder: "First name",
                                value: "{first_name}",
                                oninput: move |e: FormEvent| first_name.set(e.value()),
                            }
                            input {
                                class: "flex-1 bg-[#1e1f22] border-none rounded p-2.5 text-white placeholder-[#949ba4] focus:ring-0",
                                placeholder: "Last name",
                                value: "{last_name}",
                                oninput: move |e: FormEvent| last_name.set(e.value()),
                            }
                        }
                    }
                    input {
                        class: "w-full bg-[#1e1f22] border-none rounded p-2.5 text-white placeholder-[#949ba4] focus:ring-0",
                        r#type: "email",
                        placeholder: "Email",
                        value: "{email}",
                        oninput: move |e: FormEvent| {
                            email.set(e.value());
                            error.set(None);
                        },
                    }
                    input {
                        class: "w-full bg-[#1e1f22] border-none rounded p-2.5 text-white placeholder-[#949ba4] focus:ring-0",
                        r#type: "password",
                        placeholder: "Password",
                        value: "{password}",
                        oninput: move |e: FormEvent| {
                            password.set(e.value());
                            error.set(None);
                        },
                    }
                    if let Some(err) = error.read().as_ref() {
                        div { class: "p-3 bg-red-500/10 border border-red-500/30 rounded-lg text-red-400 text-sm",
                            "{err}"
                        }
                    }
                    button {
                        r#type: "submit",
                        class: "w-full py-2.5 bg-indigo-500 hover:bg-indigo-600 text-white rounded-lg transition-colors disabled:opacity-50",
                        disabled: *is_loading.read(),
                        if *is_loading.read() {
                            "Please wait..."
                        } else if *registering.read() {
                            "Create account"
                        } else {
                            "Sign in"
                        }
                    }
                }
                button {
                    class: "mt-4 text-sm text-[#949ba4] hover:text-white",
                    onclick: move |_| {
                        let flip = !*registering.read();
                        registering.set(flip);
                        error.set(None);
                    },
                    if *registering.read() {
                        "Already have an account? Sign in"
                    } else {
                        "New here? Create an account"
                    }
                }
            }
        }
    }
}
