fn main() {
    listing_features::cli::run();
}
