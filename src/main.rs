fn main() {
    carescribe_lib::run()
}
