//! Demo records loaded into a fresh store.

use crate::store::EntityStore;
use crate::types::{Car, Dinosaur, Discovery, MedicalRecord, Movie, Owner, Pet, Plant};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

pub fn populate(store: &EntityStore) {
    for pet in pets() {
        store.pets().insert(pet);
    }
    for dino in dinosaurs() {
        store.dinosaurs().insert(dino);
    }
    for car in cars() {
        store.cars().insert(car);
    }
    for movie in movies() {
        store.movies().insert(movie);
    }
    for plant in plants() {
        store.plants().insert(plant);
    }
    tracing::debug!("seeded demo records");
}

fn pets() -> Vec<Pet> {
    vec![
        Pet {
            name: "Max".into(),
            breed: "Golden Retriever".into(),
            age: 5,
            owner: Owner {
                name: "Alice Johnson".into(),
                email: "alice@example.com".into(),
                phone: "555-0101".into(),
            },
            medical: vec![
                MedicalRecord {
                    date: "2024-01-15".into(),
                    description: "Annual vaccination".into(),
                    vet: "Dr. Smith".into(),
                },
                MedicalRecord {
                    date: "2024-06-02".into(),
                    description: "Dental cleaning".into(),
                    vet: "Dr. Smith".into(),
                },
            ],
            tags: strings(&["friendly", "trained"]),
            ..Pet::default()
        },
        Pet {
            name: "Luna".into(),
            breed: "Siamese".into(),
            age: 3,
            owner: Owner {
                name: "Bob Martinez".into(),
                email: "bob@example.com".into(),
                phone: "555-0102".into(),
            },
            medical: vec![MedicalRecord {
                date: "2024-03-20".into(),
                description: "Spay surgery".into(),
                vet: "Dr. Lee".into(),
            }],
            tags: strings(&["indoor", "shy"]),
            ..Pet::default()
        },
        Pet {
            name: "Rocky".into(),
            breed: "Bulldog".into(),
            age: 7,
            owner: Owner {
                name: "Carol White".into(),
                email: "carol@example.com".into(),
                phone: "555-0103".into(),
            },
            medical: vec![MedicalRecord {
                date: "2023-11-08".into(),
                description: "Hip dysplasia check".into(),
                vet: "Dr. Patel".into(),
            }],
            tags: strings(&["senior", "calm"]),
            ..Pet::default()
        },
    ]
}

fn dinosaurs() -> Vec<Dinosaur> {
    vec![
        Dinosaur {
            name: "Rex".into(),
            species: "Tyrannosaurus rex".into(),
            period: "Late Cretaceous".into(),
            diet: "Carnivore".into(),
            discovered: Discovery {
                year: 1902,
                location: "Montana, USA".into(),
                paleontologist: "Barnum Brown".into(),
            },
            features: strings(&["massive skull", "tiny arms", "keen smell"]),
            ..Dinosaur::default()
        },
        Dinosaur {
            name: "Trike".into(),
            species: "Triceratops horridus".into(),
            period: "Late Cretaceous".into(),
            diet: "Herbivore".into(),
            discovered: Discovery {
                year: 1887,
                location: "Colorado, USA".into(),
                paleontologist: "Othniel Charles Marsh".into(),
            },
            features: strings(&["three horns", "bony frill"]),
            ..Dinosaur::default()
        },
        Dinosaur {
            name: "Raptor".into(),
            species: "Velociraptor mongoliensis".into(),
            period: "Late Cretaceous".into(),
            diet: "Carnivore".into(),
            discovered: Discovery {
                year: 1923,
                location: "Gobi Desert, Mongolia".into(),
                paleontologist: "Peter Kaisen".into(),
            },
            features: strings(&["sickle claw", "feathers"]),
            ..Dinosaur::default()
        },
    ]
}

fn cars() -> Vec<Car> {
    let car = |name: &str, make: &str, year: i32, price: f64, electric: bool| Car {
        name: name.into(),
        make: make.into(),
        year,
        price,
        electric,
        ..Car::default()
    };
    vec![
        car("Model 3", "Tesla", 2023, 40_240.0, true),
        car("Civic", "Honda", 2022, 24_650.0, false),
        car("Mustang Mach-E", "Ford", 2023, 42_995.0, true),
        car("Corolla", "Toyota", 2021, 21_550.0, false),
        car("Taycan", "Porsche", 2024, 90_900.0, true),
        car("Golf", "Volkswagen", 2020, 23_195.0, false),
    ]
}

fn movies() -> Vec<Movie> {
    let movie = |title: &str, year: i32, genre: &str, rating: f64, director: &str| Movie {
        title: title.into(),
        year,
        genre: genre.into(),
        rating,
        director: director.into(),
        ..Movie::default()
    };
    vec![
        movie("The Shawshank Redemption", 1994, "Drama", 9.3, "Frank Darabont"),
        movie("Inception", 2010, "Sci-Fi", 8.8, "Christopher Nolan"),
        movie("Parasite", 2019, "Thriller", 8.5, "Bong Joon-ho"),
        movie("Mad Max: Fury Road", 2015, "Action", 8.1, "George Miller"),
        movie("Dune", 2021, "Sci-Fi", 8.0, "Denis Villeneuve"),
        movie("The Dark Knight", 2008, "Action", 9.0, "Christopher Nolan"),
    ]
}

fn plants() -> Vec<Plant> {
    let plant = |name: &str, species: &str, family: &str, sunlight: &str, watering_days: u32| {
        Plant {
            name: name.into(),
            species: species.into(),
            family: family.into(),
            sunlight: sunlight.into(),
            watering_days,
            ..Plant::default()
        }
    };
    vec![
        plant("Monstera", "Monstera deliciosa", "Araceae", "indirect", 7),
        plant("Snake Plant", "Dracaena trifasciata", "Asparagaceae", "low", 14),
        plant("Fiddle Leaf Fig", "Ficus lyrata", "Moraceae", "bright", 7),
        plant("Aloe", "Aloe vera", "Asphodelaceae", "full", 21),
    ]
}
