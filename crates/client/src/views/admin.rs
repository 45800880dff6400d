//! Admin tooling: user list with impersonation.

use dioxus::prelude::*;

use super::Services;

#[component]
pub fn AdminView() -> Element {
    let services = use_context::<Services>();
    let mut version = use_signal(|| 0u64);
    let mut page = use_signal(|| 1u32);

    let load = {
        let admin = services.admin.clone();
        move |target: u32| {
            let admin = admin.clone();
            spawn(async move {
                admin.load_users(target, 25).await;
                version += 1;
            });
        }
    };

    use_hook({
        let load = load.clone();
        move || load(1)
    });

    let _ = version();
    let users = services.admin.users();
    let info = services.admin.page();
    let loading = services.admin.loading();
    let error = services.admin.error();
    let me = services.session.user().map(|u| u.id).unwrap_or_default();

    rsx! {
        div { class: "p-6 max-w-4xl mx-auto",
            h2 { class: "text-xl font-bold text-white mb-4", "Users" }
            if let Some(err) = error {
                div { class: "mb-4 p-3 bg-red-500/10 border border-red-500/30 rounded text-red-400 text-sm",
                    "{err}"
                }
            }
            if loading {
                p { class: "text-[#949ba4]", "Loading..." }
            }
            table { class: "w-full text-sm",
                thead {
                    tr { class: "text-left text-[#949ba4]",
                        th { class: "py-2", "Name" }
                        th { "Email" }
                        th { "Roles" }
                        th {}
                    }
                }
                tbody {
                    for user in users.iter() {
                        tr { key: "{user.id}", class: "border-t border-[#3f4147]",
                            td { class: "py-2 text-white", {user.display_name()} }
                            td { class: "text-[#b5bac1]", "{user.email}" }
                            td { class: "text-[#b5bac1]", {user.roles.join(", ")} }
                            td { class: "text-right",
                                if user.id != me {
                                    button {
                                        class: "px-3 py-1 bg-[#404249] hover:bg-[#4e5058] rounded text-white",
                                        onclick: {
                                            let admin = services.admin.clone();
                                            let user_id = user.id.clone();
                                            move |_| {
                                                let admin = admin.clone();
                                                let user_id = user_id.clone();
                                                spawn(async move {
                                                    // Session broadcast flips the whole
                                                    // app to the impersonated user.
                                                    admin.impersonate(&user_id).await;
                                                });
                                            }
                                        },
                                        "Act as"
                                    }
                                }
                            }
                        }
                    }
                }
            }
            div { class: "flex items-center gap-3 mt-4",
                button {
                    class: "px-3 py-1 bg-[#404249] rounded text-white disabled:opacity-50",
                    disabled: *page.read() <= 1,
                    onclick: {
                        let load = load.clone();
                        move |_| {
                            let target = page.read().saturating_sub(1).max(1);
                            page.set(target);
                            load(target);
                        }
                    },
                    "Prev"
                }
                span { class: "text-sm text-[#949ba4]",
                    {format!("Page {} · {} users", info.page.max(1), info.total_count)}
                }
                button {
                    class: "px-3 py-1 bg-[#404249] rounded text-white",
                    onclick: {
                        let load = load.clone();
                        move |_| {
                            let target = *page.read() + 1;
                            page.set(target);
                            load(target);
                        }
                    },
                    "Next"
                }
            }
        }
    }
}
