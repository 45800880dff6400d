//! Friends page: confirmed friends plus both directions of pending
//! requests.

use dioxus::prelude::*;

use super::Services;
use crate::platform::task;

#[component]
pub fn FriendsView() -> Element {
    let services = use_context::<Services>();
    let mut version = use_signal(|| 0u64);
    let mut addressee = use_signal(String::new);

    use_hook({
        let friends = services.friends.clone();
        move || {
            friends.on_change(task(move || {
                let mut tick = version;
                tick += 1;
            }));
            let friends = friends.clone();
            spawn(async move {
                friends.refresh().await;
            });
        }
    });
    use_drop({
        let friends = services.friends.clone();
        move || friends.clear_on_change()
    });

    let send_request = {
        let friends = services.friends.clone();
        move |_| {
            let target = addressee.read().trim().to_string();
            if target.is_empty() {
                return;
            }
            let friends = friends.clone();
            spawn(async move {
                if friends.send_request(&target).await.is_some() {
                    addressee.set(String::new());
                }
            });
        }
    };

    let _ = version();
    let friends = services.friends.friends();
    let received = services.friends.pending_received();
    let sent = services.friends.pending_sent();
    let loading = services.friends.loading();
    let error = services.friends.error();

    rsx! {
        div { class: "p-6 max-w-3xl mx-auto space-y-8",
            div { class: "flex gap-2",
                input {
                    class: "flex-1 bg-[#2b2d31] rounded p-2.5 text-white placeholder-[#949ba4]",
                    placeholder: "Add a friend by user id",
                    value: "{addressee}",
                    oninput: {
                        let friends = services.friends.clone();
                        move |e: FormEvent| {
                            addressee.set(e.value());
                            friends.clear_error();
                        }
                    },
                }
                button {
                    class: "px-4 py-2 bg-indigo-500 hover:bg-indigo-600 rounded text-white disabled:opacity-50",
                    disabled: loading,
                    onclick: send_request,
                    "Send request"
                }
            }
            if let Some(err) = error {
                div { class: "p-3 bg-red-500/10 border border-red-500/30 rounded text-red-400 text-sm",
                    "{err}"
                }
            }

            section {
                h2 { class: "text-xs font-bold uppercase text-[#949ba4] mb-2",
                    {format!("Incoming requests ({})", received.len())}
                }
                if received.is_empty() {
                    p { class: "text-sm text-[#949ba4]", "No incoming requests." }
                }
                for request in received.iter() {
                    div {
                        key: "{request.id}",
                        class: "flex items-center justify-between bg-[#2b2d31] rounded p-3 mb-2",
                        span { class: "text-white text-sm",
                            "{request.requester.first_name} {request.requester.last_name}"
                        }
                        div { class: "flex gap-2",
                            button {
                                class: "px-3 py-1 bg-green-600 hover:bg-green-700 rounded text-white text-sm",
                                onclick: {
                                    let friends = services.friends.clone();
                                    let id = request.id.clone();
                                    move |_| {
                                        let friends = friends.clone();
                                        let id = id.clone();
                                        spawn(async move {
                                            friends.accept(&id).await;
                                        });
                                    }
                                },
                                "Accept"
                            }
                            button {
                                class: "px-3 py-1 bg-[#404249] hover:bg-[#4e5058] rounded text-white text-sm",
                                onclick: {
                                    let friends = services.friends.clone();
                                    let id = request.id.clone();
                                    move |_| {
                                        let friends = friends.clone();
                                        let id = id.clone();
                                        spawn(async move {
                                            friends.reject(&id).await;
                                        });
                                    }
                                },
                                "Reject"
                            }
                        }
                    }
                }
            }

            section {
                h2 { class: "text-xs font-bold uppercase text-[#949ba4] mb-2",
                    {format!("Sent requests ({})", sent.len())}
                }
                for request in sent.iter() {
                    div {
                        key: "{request.id}",
                        class: "flex items-center justify-between bg-[#2b2d31] rounded p-3 mb-2",
                        span { class: "text-white text-sm",
                            "{request.addressee.first_name} {request.addressee.last_name}"
                        }
                        button {
                            class: "px-3 py-1 bg-[#404249] hover:bg-[#4e5058] rounded text-white text-sm",
                            onclick: {
                                let friends = services.friends.clone();
                                let id = request.id.clone();
                                move |_| {
                                    let friends = friends.clone();
                                    let id = id.clone();
                                    spawn(async move {
                                        friends.cancel(&id).await;
                                    });
                                }
                            },
                            "Cancel"
                        }
                    }
                }
            }

            section {
                h2 { class: "text-xs font-bold uppercase text-[#949ba4] mb-2",
                    {format!("Friends ({})", friends.len())}
                }
                if friends.is_empty() {
                    p { class: "text-sm text-[#949ba4]", "No friends yet." }
                }
                for friend in friends.iter() {
                    div {
                        key: "{friend.user_id}",
                        class: "flex items-center justify-between bg-[#2b2d31] rounded p-3 mb-2",
                        div {
                            span { class: "text-white text-sm",
                                "{friend.user.first_name} {friend.user.last_name}"
                            }
                            p { class: "text-xs text-[#949ba4]",
                                {format!("Friends since {}", friend.friends_since.format("%Y-%m-%d"))}
                            }
                        }
                        button {
                            class: "px-3 py-1 bg-red-600/80 hover:bg-red-600 rounded text-white text-sm",
                            onclick: {
                                let friends = services.friends.clone();
                                let user_id = friend.user_id.clone();
                                move |_| {
                                    let friends = friends.clone();
                                    let user_id = user_id.clone();
                                    spawn(async move {
                                        friends.remove_friend(&user_id).await;
                                    });
                                }
                            },
                            "Remove"
                        }
                    }
                }
            }
        }
    }
}
