//! Dealership management view.

use dioxus::prelude::*;
use motorbay_shared::{CreateDealershipRequest, Location};

use super::Services;

#[component]
pub fn DealershipView() -> Element {
    let services = use_context::<Services>();
    let mut version = use_signal(|| 0u64);
    let mut name = use_signal(String::new);
    let mut address = use_signal(String::new);
    let mut location = use_signal(|| None::<Location>);
    let mut worker_id = use_signal(String::new);

    use_hook({
        let dealerships = services.dealerships.clone();
        move || {
            spawn(async move {
                dealerships.refresh().await;
                version += 1;
            });
        }
    });

    let lookup_address = {
        let services = services.clone();
        move |_| {
            let query = address.read().trim().to_string();
            if query.is_empty() {
                return;
            }
            let session = services.session.clone();
            spawn(async move {
                if let Ok(results) = session.client().geocode(&query).await {
                    if let Some(hit) = results.into_iter().next() {
                        location.set(Some(Location {
                            latitude: hit.latitude,
                            longitude: hit.longitude,
                            address: Some(hit.display_name),
                        }));
                    }
                }
            });
        }
    };

    let create = {
        let dealerships = services.dealerships.clone();
        move |e: FormEvent| {
            e.prevent_default();
            let req = CreateDealershipRequest {
                name: name.read().trim().to_string(),
                description: None,
                address: address.read().trim().to_string(),
                location: location.read().clone(),
            };
            if req.name.is_empty() || req.address.is_empty() {
                return;
            }
            let dealerships = dealerships.clone();
            spawn(async move {
                dealerships.create(&req).await;
                version += 1;
            });
        }
    };

    let _ = version();
    let dealership = services.dealerships.dealership();
    let workers = services.dealerships.workers();
    let stats = services.dealerships.stats();
    let loading = services.dealerships.loading();
    let error = services.dealerships.error();

    rsx! {
        div { class: "p-6 max-w-3xl mx-auto space-y-6",
            if let Some(err) = error {
                div { class: "p-3 bg-red-500/10 border border-red-500/30 rounded text-red-400 text-sm",
                    "{err}"
                }
            }
            match dealership {
                Some(dealership) => rsx! {
                    div { class: "bg-[#2b2d31] rounded-lg p-6",
                        h2 { class: "text-xl font-bold text-white", "{dealership.name}" }
                        p { class: "text-sm text-[#949ba4]", "{dealership.address}" }
                        if let Some(stats) = stats {
                            div { class: "grid grid-cols-4 gap-4 mt-4",
                                StatTile { label: "Listings", value: stats.listing_count.to_string() }
                                StatTile { label: "Views", value: stats.total_views.to_string() }
                                StatTile { label: "Saves", value: stats.favourite_count.to_string() }
                                StatTile {
                                    label: "Rating",
                                    value: stats
                                        .average_rating
                                        .map(|r| format!("{r:.1}"))
                                        .unwrap_or_else(|| "–".to_string()),
                                }
                            }
                        }
                    }
                    div { class: "bg-[#2b2d31] rounded-lg p-6",
                        h3 { class: "text-white font-semibold mb-3", "Workers" }
                        div { class: "flex gap-2 mb-4",
                            input {
                                class: "flex-1 bg-[#1e1f22] rounded p-2 text-white placeholder-[#949ba4]",
                                placeholder: "User id",
                                value: "{worker_id}",
                                oninput: move |e: FormEvent| worker_id.set(e.value()),
                            }
                            button {
                                class: "px-3 py-1.5 bg-indigo-500 hover:bg-indigo-600 rounded text-white text-sm",
                                onclick: {
                                    let dealerships = services.dealerships.clone();
                                    move |_| {
                                        let user = worker_id.read().trim().to_string();
                                        if user.is_empty() {
                                            return;
                                        }
                                        let dealerships = dealerships.clone();
                                        spawn(async move {
                                            if dealerships.add_worker(&user, "sales").await.is_some() {
                                                worker_id.set(String::new());
                                            }
                                            version += 1;
                                        });
                                    }
                                },
                                "Add"
                            }
                        }
                        for worker in workers.iter() {
                            div {
                                key: "{worker.user.id}",
                                class: "flex items-center justify-between py-2 border-b border-[#3f4147]",
                                span { class: "text-white text-sm",
                                    "{worker.user.first_name} {worker.user.last_name} · {worker.role}"
                                }
                                button {
                                    class: "text-sm text-red-400 hover:text-red-300",
                                    onclick: {
                                        let dealerships = services.dealerships.clone();
                                        let user_id = worker.user.id.clone();
                                        move |_| {
                                            let dealerships = dealerships.clone();
                                            let user_id = user_id.clone();
                                            spawn(async move {
                                                dealerships.remove_worker(&user_id).await;
                                                version += 1;
                                            });
                                        }
                                    },
                                    "Remove"
                                }
                            }
                        }
                    }
                },
                None => rsx! {
                    form { onsubmit: create, class: "bg-[#2b2d31] rounded-lg p-6 space-y-4",
                        h2 { class: "text-xl font-bold text-white", "Create your dealership" }
                        input {
                            class: "w-full bg-[#1e1f22] rounded p-2.5 text-white placeholder-[#949ba4]",
                            placeholder: "Dealership name",
                            value: "{name}",
                            oninput: move |e: FormEvent| name.set(e.value()),
                        }
                        div { class: "flex gap-2",
                            input {
                                class: "flex-1 bg-[#1e1f22] rounded p-2.5 text-white placeholder-[#949ba4]",
                                placeholder: "Address",
                                value: "{address}",
                                oninput: move |e: FormEvent| address.set(e.value()),
                            }
                            button {
                                r#type: "button",
                                class: "px-3 py-1.5 bg-[#404249] hover:bg-[#4e5058] rounded text-white text-sm",
                                onclick: lookup_address,
                                "Locate"
                            }
                        }
                        if let Some(loc) = location.read().as_ref() {
                            p { class: "text-xs text-[#949ba4]",
                                {format!("Pinned at {:.4}, {:.4}", loc.latitude, loc.longitude)}
                            }
                        }
                        button {
                            r#type: "submit",
                            class: "px-4 py-2 bg-indigo-500 hover:bg-indigo-600 rounded text-white disabled:opacity-50",
                            disabled: loading,
                            if loading { "Creating..." } else { "Create" }
                        }
                    }
                },
            }
        }
    }
}

#[component]
fn StatTile(label: &'static str, value: String) -> Element {
    rsx! {
        div { class: "bg-[#1e1f22] rounded p-3 text-center",
            div { class: "text-lg font-bold text-white", "{value}" }
            div { class: "text-xs text-[#949ba4]", "{label}" }
        }
    }
}
