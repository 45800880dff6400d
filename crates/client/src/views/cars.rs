//! Listing search/browse, listing detail with comments, favourites.

use dioxus::prelude::*;
use motorbay_shared::{
    CarListing, CarSearchQuery, CreateCarRequest, CreateCommentRequest, FuelType, Gearbox,
    Location, UpdateCarRequest,
};

use super::Services;

#[component]
pub fn BrowseView() -> Element {
    let services = use_context::<Services>();
    let mut version = use_signal(|| 0u64);
    let mut make = use_signal(String::new);
    let mut model = use_signal(String::new);
    let mut price_to = use_signal(String::new);

    // Initial snapshot.
    use_hook({
        let cars = services.cars.clone();
        move || {
            spawn(async move {
                cars.search(CarSearchQuery {
                    page_size: 20,
                    ..Default::default()
                })
                .await;
                version += 1;
            });
        }
    });

    let run_search = {
        let cars = services.cars.clone();
        move |_| {
            let query = CarSearchQuery {
                make: non_empty(&make.read()),
                model: non_empty(&model.read()),
                price_to: price_to.read().trim().parse().ok(),
                page_size: 20,
                ..Default::default()
            };
            let cars = cars.clone();
            spawn(async move {
                cars.search(query).await;
                version += 1;
            });
        }
    };

    let _ = version();
    let results = services.cars.results();
    let loading = services.cars.loading();
    let error = services.cars.error();
    let mut detail = use_signal(|| None::<CarListing>);
    let mut selling = use_signal(|| false);

    rsx! {
        div { class: "p-6 max-w-5xl mx-auto",
            if let Some(car) = detail.read().clone() {
                DetailModal { car, on_close: move |_| detail.set(None) }
            }
            if *selling.read() {
                SellModal {
                    on_close: move |_| selling.set(false),
                    on_created: move |_| {
                        selling.set(false);
                        version += 1;
                    },
                }
            }
            div { class: "flex gap-3 mb-6",
                input {
                    class: "bg-[#2b2d31] rounded p-2.5 text-white placeholder-[#949ba4]",
                    placeholder: "Make",
                    value: "{make}",
                    oninput: move |e: FormEvent| make.set(e.value()),
                }
                input {
                    class: "bg-[#2b2d31] rounded p-2.5 text-white placeholder-[#949ba4]",
                    placeholder: "Model",
                    value: "{model}",
                    oninput: move |e: FormEvent| model.set(e.value()),
                }
                input {
                    class: "bg-[#2b2d31] rounded p-2.5 text-white placeholder-[#949ba4] w-32",
                    placeholder: "Max price",
                    value: "{price_to}",
                    oninput: move |e: FormEvent| price_to.set(e.value()),
                }
                button {
                    class: "px-4 py-2 bg-indigo-500 hover:bg-indigo-600 rounded text-white disabled:opacity-50",
                    disabled: loading,
                    onclick: run_search,
                    if loading { "Searching..." } else { "Search" }
                }
                button {
                    class: "ml-auto px-4 py-2 bg-[#404249] hover:bg-[#4e5058] rounded text-white",
                    onclick: move |_| selling.set(true),
                    "Sell a car"
                }
            }
            if let Some(err) = error {
                div { class: "mb-4 p-3 bg-red-500/10 border border-red-500/30 rounded text-red-400 text-sm",
                    "{err}"
                }
            }
            if results.is_empty() && !loading {
                p { class: "text-[#949ba4]", "No listings match your search." }
            }
            div { class: "grid grid-cols-1 md:grid-cols-2 gap-4",
                for car in results.iter() {
                    CarCard {
                        key: "{car.id}",
                        car: car.clone(),
                        on_changed: move |_| version += 1,
                        on_open: move |car| detail.set(Some(car)),
                    }
                }
            }
        }
    }
}

#[component]
fn CarCard(
    car: CarListing,
    on_changed: EventHandler<()>,
    on_open: EventHandler<CarListing>,
) -> Element {
    let services = use_context::<Services>();
    let favourited = services.favourites.contains(&car.id);

    rsx! {
        div { class: "bg-[#2b2d31] rounded-lg p-4 flex flex-col gap-2",
            div { class: "flex items-start justify-between",
                div {
                    class: "cursor-pointer",
                    onclick: {
                        let car = car.clone();
                        move |_| on_open.call(car.clone())
                    },
                    h3 { class: "text-white font-semibold",
                        "{car.year} {car.make} {car.model}"
                    }
                    p { class: "text-sm text-[#949ba4]", "{car.mileage} km" }
                }
                span { class: "text-lg font-bold text-indigo-400",
                    {format!("€{:.0}", car.price)}
                }
            }
            if let Some(description) = car.description.as_ref() {
                p { class: "text-sm text-[#b5bac1] line-clamp-2", "{description}" }
            }
            div { class: "flex justify-end",
                button {
                    class: "px-3 py-1 rounded text-sm bg-[#404249] hover:bg-[#4e5058] text-white",
                    onclick: {
                        let favourites = services.favourites.clone();
                        let car = car.clone();
                        move |_| {
                            let favourites = favourites.clone();
                            let car = car.clone();
                            let on_changed = on_changed;
                            spawn(async move {
                                if favourites.contains(&car.id) {
                                    favourites.remove(&car.id).await;
                                } else {
                                    favourites.add(&car).await;
                                }
                                on_changed.call(());
                            });
                        }
                    },
                    if favourited { "★ Saved" } else { "☆ Save" }
                }
            }
        }
    }
}

#[component]
pub fn FavouritesView() -> Element {
    let services = use_context::<Services>();
    let mut version = use_signal(|| 0u64);

    use_hook({
        let favourites = services.favourites.clone();
        move || {
            spawn(async move {
                favourites.refresh().await;
                version += 1;
            });
        }
    });

    let _ = version();
    let cars = services.favourites.cars();
    let loading = services.favourites.loading();
    let mut detail = use_signal(|| None::<CarListing>);

    rsx! {
        div { class: "p-6 max-w-5xl mx-auto",
            if let Some(car) = detail.read().clone() {
                DetailModal { car, on_close: move |_| detail.set(None) }
            }
            h2 { class: "text-xl font-bold text-white mb-4", "Saved listings" }
            if loading {
                p { class: "text-[#949ba4]", "Loading..." }
            } else if cars.is_empty() {
                p { class: "text-[#949ba4]", "Nothing saved yet." }
            }
            div { class: "grid grid-cols-1 md:grid-cols-2 gap-4",
                for car in cars.iter() {
                    CarCard {
                        key: "{car.id}",
                        car: car.clone(),
                        on_changed: move |_| version += 1,
                        on_open: move |car| detail.set(Some(car)),
                    }
                }
            }
        }
    }
}

/// Listing detail with its comment thread. Owners get price editing
/// and deletion; everyone else gets the comment composer.
#[component]
fn DetailModal(car: CarListing, on_close: EventHandler<()>) -> Element {
    let services = use_context::<Services>();
    let mut version = use_signal(|| 0u64);
    let mut draft = use_signal(String::new);
    let mut rating = use_signal(|| None::<u8>);
    let mut new_price = use_signal(String::new);

    use_hook({
        let comments = services.comments.clone();
        let car_id = car.id.clone();
        move || {
            spawn(async move {
                comments.load(&car_id).await;
                version += 1;
            });
        }
    });

    let submit = {
        let comments = services.comments.clone();
        let car_id = car.id.clone();
        move |_| {
            let content = draft.read().trim().to_string();
            if content.is_empty() {
                return;
            }
            let comments = comments.clone();
            let car_id = car_id.clone();
            let req = CreateCommentRequest {
                content,
                rating: *rating.read(),
            };
            spawn(async move {
                if comments.add(&car_id, &req).await.is_some() {
                    draft.set(String::new());
                    rating.set(None);
                }
                version += 1;
            });
        }
    };

    let _ = version();
    let comments = services.comments.comments();
    let me = services.session.user().map(|u| u.id).unwrap_or_default();

    rsx! {
        div { class: "fixed inset-0 bg-black/70 flex items-center justify-center z-50",
            div { class: "bg-[#313338] rounded-lg shadow-2xl w-full max-w-lg mx-4 max-h-[80vh] flex flex-col",
                div { class: "px-6 py-4 border-b border-[#3f4147] flex items-start justify-between",
                    div {
                        h3 { class: "text-xl font-bold text-white",
                            "{car.year} {car.make} {car.model}"
                        }
                        p { class: "text-sm text-[#949ba4]",
                            {format!("€{:.0} · {} km", car.price, car.mileage)}
                        }
                    }
                    button {
                        class: "text-[#949ba4] hover:text-white",
                        onclick: move |_| on_close.call(()),
                        "✕"
                    }
                }
                if car.seller_id == me {
                    div { class: "px-6 py-3 border-b border-[#3f4147] flex items-center gap-2",
                        input {
                            class: "w-28 bg-[#1e1f22] rounded p-2 text-white placeholder-[#949ba4] text-sm",
                            placeholder: "New price",
                            value: "{new_price}",
                            oninput: move |e: FormEvent| new_price.set(e.value()),
                        }
                        button {
                            class: "px-3 py-1.5 bg-[#404249] hover:bg-[#4e5058] rounded text-white text-sm",
                            onclick: {
                                let cars = services.cars.clone();
                                let id = car.id.clone();
                                move |_| {
                                    let Ok(price) = new_price.read().trim().parse::<f64>() else {
                                        return;
                                    };
                                    let cars = cars.clone();
                                    let id = id.clone();
                                    spawn(async move {
                                        let req = UpdateCarRequest {
                                            price: Some(price),
                                            ..Default::default()
                                        };
                                        if cars.update(&id, &req).await.is_some() {
                                            on_close.call(());
                                        }
                                    });
                                }
                            },
                            "Update price"
                        }
                        button {
                            class: "ml-auto px-3 py-1.5 bg-red-600/80 hover:bg-red-600 rounded text-white text-sm",
                            onclick: {
                                let cars = services.cars.clone();
                                let id = car.id.clone();
                                move |_| {
                                    let cars = cars.clone();
                                    let id = id.clone();
                                    spawn(async move {
                                        if cars.remove(&id).await {
                                            on_close.call(());
                                        }
                                    });
                                }
                            },
                            "Delete listing"
                        }
                    }
                }
                div { class: "flex-1 overflow-y-auto p-6 space-y-3",
                    if let Some(description) = car.description.as_ref() {
                        p { class: "text-sm text-[#b5bac1]", "{description}" }
                    }
                    h4 { class: "text-xs font-bold uppercase text-[#949ba4] pt-2",
                        {format!("Comments ({})", comments.len())}
                    }
                    for comment in comments.iter() {
                        div {
                            key: "{comment.id}",
                            class: "bg-[#2b2d31] rounded p-3",
                            div { class: "flex items-center justify-between",
                                span { class: "text-sm text-white font-medium",
                                    "{comment.author.first_name} {comment.author.last_name}"
                                }
                                div { class: "flex items-center gap-2",
                                    if let Some(stars) = comment.rating {
                                        span { class: "text-xs text-amber-400",
                                            {"★".repeat(stars as usize)}
                                        }
                                    }
                                    if comment.author.id == me {
                                        button {
                                            class: "text-xs text-red-400 hover:text-red-300",
                                            onclick: {
                                                let comments = services.comments.clone();
                                                let id = comment.id.clone();
                                                move |_| {
                                                    let comments = comments.clone();
                                                    let id = id.clone();
                                                    spawn(async move {
                                                        comments.remove(&id).await;
                                                        version += 1;
                                                    });
                                                }
                                            },
                                            "delete"
                                        }
                                    }
                                }
                            }
                            p { class: "text-sm text-[#b5bac1] mt-1", "{comment.content}" }
                        }
                    }
                }
                div { class: "px-6 py-4 border-t border-[#3f4147] flex gap-2",
                    select {
                        class: "bg-[#1e1f22] rounded p-2 text-white text-sm",
                        onchange: move |e: FormEvent| rating.set(e.value().parse().ok()),
                        option { value: "", "No rating" }
                        for stars in 1..=5u8 {
                            option { value: "{stars}", {"★".repeat(stars as usize)} }
                        }
                    }
                    input {
                        class: "flex-1 bg-[#1e1f22] rounded p-2 text-white placeholder-[#949ba4]",
                        placeholder: "Share your experience...",
                        value: "{draft}",
                        oninput: move |e: FormEvent| draft.set(e.value()),
                    }
                    button {
                        class: "px-3 py-1.5 bg-indigo-500 hover:bg-indigo-600 rounded text-white text-sm",
                        onclick: submit,
                        "Post"
                    }
                }
            }
        }
    }
}

/// Create-listing form. The address is resolved to coordinates through
/// the geocoding lookup before submit.
#[component]
fn SellModal(on_close: EventHandler<()>, on_created: EventHandler<()>) -> Element {
    let services = use_context::<Services>();
    let mut make = use_signal(String::new);
    let mut model = use_signal(String::new);
    let mut year = use_signal(String::new);
    let mut price = use_signal(String::new);
    let mut mileage = use_signal(String::new);
    let mut fuel = use_signal(|| FuelType::Petrol);
    let mut gearbox = use_signal(|| Gearbox::Manual);
    let mut description = use_signal(String::new);
    let mut address = use_signal(String::new);
    let mut location = use_signal(|| None::<Location>);
    let mut error = use_signal(|| None::<String>);
    let mut is_saving = use_signal(|| false);

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

    let submit = {
        let services = services.clone();
        move |e: FormEvent| {
            e.prevent_default();
            let (Ok(year_value), Ok(price_value), Ok(mileage_value)) = (
                year.read().trim().parse::<u16>(),
                price.read().trim().parse::<f64>(),
                mileage.read().trim().parse::<u32>(),
            ) else {
                error.set(Some("Year, price and mileage must be numbers".to_string()));
                return;
            };
            let req = CreateCarRequest {
                make: make.read().trim().to_string(),
                model: model.read().trim().to_string(),
                year: year_value,
                price: price_value,
                mileage: mileage_value,
                fuel: fuel.read().clone(),
                gearbox: gearbox.read().clone(),
                body_type: None,
                description: non_empty(&description.read()),
                image_urls: Vec::new(),
                location: location.read().clone(),
                dealership_id: None,
            };
            if req.make.is_empty() || req.model.is_empty() {
                error.set(Some("Make and model are required".to_string()));
                return;
            }

            is_saving.set(true);
            let cars = services.cars.clone();
            spawn(async move {
                match cars.create(&req).await {
                    Some(_) => on_created.call(()),
                    None => {
                        error.set(cars.error());
                        is_saving.set(false);
                    }
                }
            });
        }
    };

    rsx! {
        div { class: "fixed inset-0 bg-black/70 flex items-center justify-center z-50",
            form {
                onsubmit: submit,
                class: "bg-[#313338] rounded-lg shadow-2xl w-full max-w-lg mx-4 p-6 space-y-3",
                div { class: "flex items-center justify-between",
                    h3 { class: "text-xl font-bold text-white", "Sell a car" }
                    button {
                        r#type: "button",
                        class: "text-[#949ba4] hover:text-white",
                        onclick: move |_| on_close.call(()),
                        "✕"
                    }
                }
                div { class: "flex gap-2",
                    input {
                        class: "flex-1 bg-[#1e1f22] rounded p-2.5 text-white placeholder-[#949ba4]",
                        placeholder: "Make",
                        value: "{make}",
                        oninput: move |e: FormEvent| {
                            make.set(e.value());
                            error.set(None);
                        },
                    }
                    input {
                        class: "flex-1 bg-[#1e1f22] rounded p-2.5 text-white placeholder-[#949ba4]",
                        placeholder: "Model",
                        value: "{model}",
                        oninput: move |e: FormEvent| {
                            model.set(e.value());
                            error.set(None);
                        },
                    }
                }
                div { class: "flex gap-2",
                    input {
                        class: "w-24 bg-[#1e1f22] rounded p-2.5 text-white placeholder-[#949ba4]",
                        placeholder: "Year",
                        value: "{year}",
                        oninput: move |e: FormEvent| year.set(e.value()),
                    }
                    input {
                        class: "flex-1 bg-[#1e1f22] rounded p-2.5 text-white placeholder-[#949ba4]",
                        placeholder: "Price",
                        value: "{price}",
                        oninput: move |e: FormEvent| price.set(e.value()),
                    }
                    input {
                        class: "flex-1 bg-[#1e1f22] rounded p-2.5 text-white placeholder-[#949ba4]",
                        placeholder: "Mileage (km)",
                        value: "{mileage}",
                        oninput: move |e: FormEvent| mileage.set(e.value()),
                    }
                }
                div { class: "flex gap-2",
                    select {
                        class: "flex-1 bg-[#1e1f22] rounded p-2.5 text-white",
                        onchange: move |e: FormEvent| {
                            fuel.set(match e.value().as_str() {
                                "Diesel" => FuelType::Diesel,
                                "Hybrid" => FuelType::Hybrid,
                                "Electric" => FuelType::Electric,
                                "Lpg" => FuelType::Lpg,
                                _ => FuelType::Petrol,
                            });
                        },
                        option { value: "Petrol", "Petrol" }
                        option { value: "Diesel", "Diesel" }
                        option { value: "Hybrid", "Hybrid" }
                        option { value: "Electric", "Electric" }
                        option { value: "Lpg", "LPG" }
                    }
                    select {
                        class: "flex-1 bg-[#1e1f22] rounded p-2.5 text-white",
                        onchange: move |e: FormEvent| {
                            gearbox.set(if e.value() == "Automatic" {
                                Gearbox::Automatic
                            } else {
                                Gearbox::Manual
                            });
                        },
                        option { value: "Manual", "Manual" }
                        option { value: "Automatic", "Automatic" }
                    }
                }
                textarea {
                    class: "w-full bg-[#1e1f22] rounded p-2.5 text-white placeholder-[#949ba4]",
                    rows: 3,
                    placeholder: "Description",
                    value: "{description}",
                    oninput: move |e: FormEvent| description.set(e.value()),
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
                if let Some(err) = error.read().as_ref() {
                    div { class: "p-3 bg-red-500/10 border border-red-500/30 rounded text-red-400 text-sm",
                        "{err}"
                    }
                }
                button {
                    r#type: "submit",
                    class: "w-full py-2.5 bg-indigo-500 hover:bg-indigo-600 rounded text-white disabled:opacity-50",
                    disabled: *is_saving.read(),
                    if *is_saving.read() { "Publishing..." } else { "Publish listing" }
                }
            }
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
